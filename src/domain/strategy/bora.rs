//! Trend following: price above the long SMA with a rising fast EMA stacked
//! over the slow EMA.

use super::{
    EvalContext, Strategy, check, ensure_shorter, prepare, read_non_negative, read_number,
    read_period,
};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::signals::{linear_slope, pct_change, strictly_increasing, tail_valid};
use crate::domain::verdict::{Criterion, Verdict};
use crate::ports::config_port::ConfigPort;
use std::fmt;
use std::str::FromStr;

const SECTION: &str = "bora";

/// How "trending up" is measured over the lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMethod {
    /// Least-squares slope above a threshold.
    Slope,
    /// Percent change first-to-last above a threshold.
    Pct,
    /// Every value above the one before.
    Strict,
}

impl FromStr for TrendMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "slope" => Ok(TrendMethod::Slope),
            "pct" => Ok(TrendMethod::Pct),
            "strict" => Ok(TrendMethod::Strict),
            other => Err(format!("unknown trend method '{other}' (slope, pct, strict)")),
        }
    }
}

impl fmt::Display for TrendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendMethod::Slope => write!(f, "slope"),
            TrendMethod::Pct => write!(f, "pct"),
            TrendMethod::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoraParams {
    pub trend_period: usize,
    pub fast_ema: usize,
    pub slow_ema: usize,
    pub lookback: usize,
    pub method: TrendMethod,
    pub slope_threshold: f64,
    pub pct_threshold: f64,
}

impl Default for BoraParams {
    fn default() -> Self {
        Self {
            trend_period: 200,
            fast_ema: 21,
            slow_ema: 50,
            lookback: 10,
            method: TrendMethod::Slope,
            slope_threshold: 0.0,
            pct_threshold: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Bora {
    params: BoraParams,
}

impl Bora {
    pub fn new(params: BoraParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = BoraParams::default();
        let method = match config.get_string(SECTION, "method") {
            Some(s) => s
                .parse()
                .map_err(|reason: String| ScreenerError::invalid(SECTION, "method", reason))?,
            None => d.method,
        };
        let lookback = read_period(config, SECTION, "lookback", d.lookback)?;
        if lookback < 2 {
            return Err(ScreenerError::invalid(
                SECTION,
                "lookback",
                "lookback must be at least 2",
            ));
        }
        let params = BoraParams {
            trend_period: read_period(config, SECTION, "trend_period", d.trend_period)?,
            fast_ema: read_period(config, SECTION, "fast_ema", d.fast_ema)?,
            slow_ema: read_period(config, SECTION, "slow_ema", d.slow_ema)?,
            lookback,
            method,
            slope_threshold: read_number(config, SECTION, "slope_threshold", d.slope_threshold)?,
            pct_threshold: read_non_negative(config, SECTION, "pct_threshold", d.pct_threshold)?,
        };
        ensure_shorter(
            SECTION,
            "fast_ema",
            params.fast_ema,
            "slow_ema",
            params.slow_ema,
        )?;
        Ok(Self::new(params))
    }

    fn trending_up(&self, window: &[f64]) -> Option<bool> {
        if window.len() < self.params.lookback {
            return None;
        }
        match self.params.method {
            TrendMethod::Slope => linear_slope(window).map(|s| s > self.params.slope_threshold),
            TrendMethod::Pct => {
                let first = *window.first()?;
                let last = *window.last()?;
                pct_change(first, last).map(|pct| pct > self.params.pct_threshold)
            }
            TrendMethod::Strict => Some(strictly_increasing(window)),
        }
    }
}

impl Strategy for Bora {
    fn name(&self) -> &'static str {
        "bora"
    }

    fn min_bars(&self) -> usize {
        let p = &self.params;
        p.trend_period
            .max(p.slow_ema)
            .max(p.fast_ema + p.lookback - 1)
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Sma(self.params.trend_period),
            IndicatorType::Ema(self.params.fast_ema),
            IndicatorType::Ema(self.params.slow_ema),
        ]
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let close = ctx.bars[prep.last].close;
        let trend = prep.last(IndicatorType::Sma(p.trend_period));
        let fast_type = IndicatorType::Ema(p.fast_ema);
        let fast = prep.last(fast_type);
        let slow = prep.last(IndicatorType::Ema(p.slow_ema));

        let window = prep
            .series(fast_type)
            .map(|s| tail_valid(s, p.lookback))
            .unwrap_or_default();
        let trending = self.trending_up(&window);
        if let Some(slope) = linear_slope(&window) {
            prep.readings.insert_value("ema_fast_slope", slope);
        }

        let trend_criterion = check("fast_ema_trending_up", trending)
            .with_detail(format!("{} over {} bars", p.method, p.lookback));
        let criteria: Vec<Criterion> = vec![
            check("close_above_trend_sma", trend.map(|t| close > t)),
            check(
                "fast_ema_above_slow_ema",
                fast.zip(slow).map(|(f, s)| f > s),
            ),
            trend_criterion,
        ];
        Ok(Verdict::from_criteria(self.name(), prep.readings, criteria))
    }

    fn describe(&self) -> String {
        let p = &self.params;
        format!(
            "close > SMA({}), EMA({}) > EMA({}), EMA({}) up over {} bars by {}",
            p.trend_period, p.fast_ema, p.slow_ema, p.fast_ema, p.lookback, p.method
        )
    }
}
