//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values aligned with its input bars

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod psar;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use ema::calculate_ema;
pub use sma::calculate_sma;

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    /// Named scalar parts. `Simple` values have a single unnamed part.
    pub fn components(&self) -> Vec<(Option<&'static str>, f64)> {
        match *self {
            IndicatorValue::Simple(v) => vec![(None, v)],
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => vec![
                (Some("line"), line),
                (Some("signal"), signal),
                (Some("histogram"), histogram),
            ],
            IndicatorValue::Stochastic { k, d } => vec![(Some("k"), k), (Some("d"), d)],
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => vec![
                (Some("upper"), upper),
                (Some("middle"), middle),
                (Some("lower"), lower),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    /// Wilder-smoothed RSI.
    Rsi(usize),
    /// RSI from simple rolling means of gains and losses.
    CutlerRsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Psar {
        step_x1000: u32,
        max_step_x1000: u32,
    },
    Highest(usize),
    Lowest(usize),
    VolumeSma(usize),
}

impl IndicatorType {
    /// Compute this indicator over `bars`.
    pub fn compute(&self, bars: &[OhlcvBar]) -> IndicatorSeries {
        match *self {
            IndicatorType::Sma(period) => sma::calculate_sma(bars, period),
            IndicatorType::Ema(period) => ema::calculate_ema(bars, period),
            IndicatorType::Rsi(period) => rsi::calculate_rsi(bars, period),
            IndicatorType::CutlerRsi(period) => rsi::calculate_cutler_rsi(bars, period),
            IndicatorType::Macd { fast, slow, signal } => {
                macd::calculate_macd(bars, fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => bollinger::calculate_bollinger(bars, period, stddev_mult_x100),
            IndicatorType::Stochastic { k_period, d_period } => {
                stochastic::calculate_stochastic(bars, k_period, d_period)
            }
            IndicatorType::Psar {
                step_x1000,
                max_step_x1000,
            } => psar::calculate_psar(bars, step_x1000, max_step_x1000),
            IndicatorType::Highest(period) => rolling::calculate_highest(bars, period),
            IndicatorType::Lowest(period) => rolling::calculate_lowest(bars, period),
            IndicatorType::VolumeSma(period) => rolling::calculate_volume_sma(bars, period),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The value at `index` if it exists and is past warm-up.
    pub fn get(&self, index: usize) -> Option<&IndicatorValue> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| &p.value)
    }

    /// Scalar value at `index` for `Simple` series.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.get(index)? {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }

    pub fn last_simple(&self) -> Option<f64> {
        self.values.len().checked_sub(1).and_then(|i| self.simple_at(i))
    }

    /// Valid scalar values, oldest first, with their indices.
    pub fn valid_simple(&self) -> Vec<(usize, f64)> {
        (0..self.values.len())
            .filter_map(|i| self.simple_at(i).map(|v| (i, v)))
            .collect()
    }
}

pub(crate) fn invalid_point(date: NaiveDate, value: IndicatorValue) -> IndicatorPoint {
    IndicatorPoint {
        date,
        valid: false,
        value,
    }
}

pub(crate) fn simple_point(date: NaiveDate, valid: bool, value: f64) -> IndicatorPoint {
    IndicatorPoint {
        date,
        valid,
        value: IndicatorValue::Simple(if valid { value } else { 0.0 }),
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::CutlerRsi(period) => write!(f, "CUTLER_RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Psar {
                step_x1000,
                max_step_x1000,
            } => write!(
                f,
                "PSAR({},{})",
                *step_x1000 as f64 / 1000.0,
                *max_step_x1000 as f64 / 1000.0
            ),
            IndicatorType::Highest(period) => write!(f, "HIGHEST({})", period),
            IndicatorType::Lowest(period) => write!(f, "LOWEST({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
        }
    }
}
