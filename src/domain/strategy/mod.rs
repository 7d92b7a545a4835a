//! Screening strategies.
//!
//! Each strategy is a named rule set over a symbol's bars (and optionally a
//! benchmark series and fundamentals) that yields a [`Verdict`]. Parameters
//! come from the strategy's INI section, falling back to the defaults on each
//! `*Params` type.

pub mod bora;
pub mod canslim;
pub mod golden_cross;
pub mod leap;
pub mod most_traded;
pub mod sector_rotation;
pub mod stage2;
pub mod swing;
pub mod trending;

use crate::domain::error::ScreenerError;
use crate::domain::fundamentals::Fundamentals;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::indicator_engine::{IndicatorResult, compute_indicators};
use crate::domain::ohlcv::{OhlcvBar, bars_until};
use crate::domain::verdict::{Criterion, Verdict};
use crate::ports::config_port::ConfigPort;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Inputs for evaluating one symbol. `bars` is already cut at the
/// evaluation date; the last bar is the one being judged.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub symbol: &'a str,
    pub bars: &'a [OhlcvBar],
    pub benchmark: Option<&'a [OhlcvBar]>,
    pub fundamentals: Option<&'a Fundamentals>,
}

impl<'a> EvalContext<'a> {
    pub fn new(symbol: &'a str, bars: &'a [OhlcvBar]) -> Self {
        Self {
            symbol,
            bars,
            benchmark: None,
            fundamentals: None,
        }
    }

    /// Attach the benchmark, cut at the symbol's last bar so both series
    /// are judged on the same date.
    pub fn with_benchmark(mut self, benchmark: &'a [OhlcvBar]) -> Self {
        let aligned = match self.bars.last() {
            Some(last) => bars_until(benchmark, last.date),
            None => benchmark,
        };
        self.benchmark = Some(aligned);
        self
    }

    pub fn with_fundamentals(mut self, fundamentals: &'a Fundamentals) -> Self {
        self.fundamentals = Some(fundamentals);
        self
    }
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fewest bars `evaluate` accepts.
    fn min_bars(&self) -> usize;

    fn indicators(&self) -> Vec<IndicatorType>;

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError>;

    /// One-line parameter summary for listings.
    fn describe(&self) -> String;

    /// Reading that orders verdicts of equal score, highest first.
    fn rank_by(&self) -> Option<&'static str> {
        None
    }

    /// How many passing verdicts survive ranking; the rest fail `top_n`.
    fn keep_top(&self) -> Option<usize> {
        None
    }
}

/// Indicators computed for one evaluation, plus the reading snapshot at the
/// last bar.
pub(crate) struct Prepared {
    pub indicators: HashMap<IndicatorType, IndicatorSeries>,
    pub readings: IndicatorResult,
    pub last: usize,
}

impl Prepared {
    pub fn series(&self, indicator_type: IndicatorType) -> Option<&IndicatorSeries> {
        self.indicators.get(&indicator_type)
    }

    /// Valid scalar value of `indicator_type` at the last bar.
    pub fn last(&self, indicator_type: IndicatorType) -> Option<f64> {
        self.series(indicator_type)?.simple_at(self.last)
    }

    /// Valid scalar value `bars_back` bars before the last one.
    pub fn back(&self, indicator_type: IndicatorType, bars_back: usize) -> Option<f64> {
        let index = self.last.checked_sub(bars_back)?;
        self.series(indicator_type)?.simple_at(index)
    }
}

/// Check the bar count and compute the strategy's indicators.
pub(crate) fn prepare(
    strategy: &dyn Strategy,
    ctx: &EvalContext<'_>,
) -> Result<Prepared, ScreenerError> {
    let minimum = strategy.min_bars().max(1);
    if ctx.bars.len() < minimum {
        return Err(ScreenerError::InsufficientData {
            symbol: ctx.symbol.to_string(),
            bars: ctx.bars.len(),
            minimum,
        });
    }
    let indicators = compute_indicators(ctx.bars, &strategy.indicators());
    let last = ctx.bars.len() - 1;
    let readings = IndicatorResult::at(ctx.symbol, ctx.bars, last, &indicators).ok_or_else(|| {
        ScreenerError::NoData {
            symbol: ctx.symbol.to_string(),
        }
    })?;
    Ok(Prepared {
        indicators,
        readings,
        last,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    Stage2,
    GoldenCross,
    Bora,
    Canslim,
    LeapDip,
    LeapGap,
    Swing,
    Trending,
    MostTraded,
    SectorRotation,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 10] = [
        StrategyKind::Stage2,
        StrategyKind::GoldenCross,
        StrategyKind::Bora,
        StrategyKind::Canslim,
        StrategyKind::LeapDip,
        StrategyKind::LeapGap,
        StrategyKind::Swing,
        StrategyKind::Trending,
        StrategyKind::MostTraded,
        StrategyKind::SectorRotation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Stage2 => "stage2",
            StrategyKind::GoldenCross => "golden_cross",
            StrategyKind::Bora => "bora",
            StrategyKind::Canslim => "canslim",
            StrategyKind::LeapDip => "leap_dip",
            StrategyKind::LeapGap => "leap_gap",
            StrategyKind::Swing => "swing",
            StrategyKind::Trending => "trending",
            StrategyKind::MostTraded => "most_traded",
            StrategyKind::SectorRotation => "sector_rotation",
        }
    }

    /// INI section holding the parameters.
    pub fn section(self) -> &'static str {
        match self {
            StrategyKind::LeapDip | StrategyKind::LeapGap => "leap",
            other => other.name(),
        }
    }

    /// Whether the strategy reads the benchmark series.
    pub fn needs_benchmark(self) -> bool {
        matches!(self, StrategyKind::Canslim | StrategyKind::SectorRotation)
    }

    pub fn needs_fundamentals(self) -> bool {
        matches!(self, StrategyKind::Canslim)
    }

    pub fn build(self, config: &dyn ConfigPort) -> Result<Box<dyn Strategy>, ScreenerError> {
        Ok(match self {
            StrategyKind::Stage2 => Box::new(stage2::Stage2::from_config(config)?),
            StrategyKind::GoldenCross => {
                Box::new(golden_cross::GoldenCross::from_config(config)?)
            }
            StrategyKind::Bora => Box::new(bora::Bora::from_config(config)?),
            StrategyKind::Canslim => Box::new(canslim::Canslim::from_config(config)?),
            StrategyKind::LeapDip => Box::new(leap::LeapDip::from_config(config)?),
            StrategyKind::LeapGap => Box::new(leap::LeapGap::from_config(config)?),
            StrategyKind::Swing => Box::new(swing::Swing::from_config(config)?),
            StrategyKind::Trending => Box::new(trending::Trending::from_config(config)?),
            StrategyKind::MostTraded => Box::new(most_traded::MostTraded::from_config(config)?),
            StrategyKind::SectorRotation => {
                Box::new(sector_rotation::SectorRotation::from_config(config)?)
            }
        })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ScreenerError::UnknownStrategy(s.trim().to_string()))
    }
}

/// Parse a comma-separated strategy list, dropping repeats.
pub fn parse_strategy_list(input: &str) -> Result<Vec<StrategyKind>, ScreenerError> {
    let mut kinds = Vec::new();
    for token in input.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let kind: StrategyKind = token.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        return Err(ScreenerError::invalid(
            "screener",
            "strategies",
            "no strategies listed",
        ));
    }
    Ok(kinds)
}

pub fn build_strategies(
    kinds: &[StrategyKind],
    config: &dyn ConfigPort,
) -> Result<Vec<Box<dyn Strategy>>, ScreenerError> {
    kinds.iter().map(|k| k.build(config)).collect()
}

/// Parse `[section] key`, falling back to `default` when unset. A present
/// but malformed value is an error rather than a silent default.
pub(crate) fn read_number<T>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, ScreenerError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match config.get_string(section, key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            ScreenerError::invalid(section, key, format!("'{}' is not a number: {e}", raw.trim()))
        }),
        None => Ok(default),
    }
}

pub(crate) fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScreenerError> {
    let value: i64 = read_number(config, section, key, default as i64)?;
    if value <= 0 {
        return Err(ScreenerError::invalid(
            section,
            key,
            format!("{key} must be a positive integer"),
        ));
    }
    Ok(value as usize)
}

/// A positive integer that must fit in `u32`.
pub(crate) fn read_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: u32,
) -> Result<u32, ScreenerError> {
    let value = read_period(config, section, key, default as usize)?;
    u32::try_from(value).map_err(|_| {
        ScreenerError::invalid(section, key, format!("{key} must be at most {}", u32::MAX))
    })
}

/// `true`/`false`, `yes`/`no` or `1`/`0`.
pub(crate) fn read_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, ScreenerError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(ScreenerError::invalid(
            section,
            key,
            format!("'{other}' is not a boolean"),
        )),
    }
}

/// Parameters carried in indicator keys as fixed-point integers must not
/// round to zero or overflow.
pub(crate) fn ensure_scaled(
    section: &str,
    key: &str,
    value: f64,
    scale: f64,
) -> Result<(), ScreenerError> {
    let scaled = (value * scale).round();
    if !(1.0..=u32::MAX as f64).contains(&scaled) {
        return Err(ScreenerError::invalid(
            section,
            key,
            format!("{key} must be between {} and {}", 1.0 / scale, u32::MAX as f64 / scale),
        ));
    }
    Ok(())
}

pub(crate) fn read_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScreenerError> {
    let value: f64 = read_number(config, section, key, default)?;
    if !(value > 0.0 && value.is_finite()) {
        return Err(ScreenerError::invalid(
            section,
            key,
            format!("{key} must be positive"),
        ));
    }
    Ok(value)
}

pub(crate) fn read_non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScreenerError> {
    let value: f64 = read_number(config, section, key, default)?;
    if !(value >= 0.0 && value.is_finite()) {
        return Err(ScreenerError::invalid(
            section,
            key,
            format!("{key} must be non-negative"),
        ));
    }
    Ok(value)
}

/// A fraction in (0, 1].
pub(crate) fn read_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScreenerError> {
    let value: f64 = read_number(config, section, key, default)?;
    if !(value > 0.0 && value <= 1.0) {
        return Err(ScreenerError::invalid(
            section,
            key,
            format!("{key} must be in (0, 1]"),
        ));
    }
    Ok(value)
}

/// An oscillator level in [0, 100].
pub(crate) fn read_level(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ScreenerError> {
    let value: f64 = read_number(config, section, key, default)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ScreenerError::invalid(
            section,
            key,
            format!("{key} must be between 0 and 100"),
        ));
    }
    Ok(value)
}

pub(crate) fn ensure_shorter(
    section: &str,
    fast_key: &str,
    fast: usize,
    slow_key: &str,
    slow: usize,
) -> Result<(), ScreenerError> {
    if fast >= slow {
        return Err(ScreenerError::invalid(
            section,
            fast_key,
            format!("{fast_key} ({fast}) must be less than {slow_key} ({slow})"),
        ));
    }
    Ok(())
}

/// Criterion from a comparison that may lack inputs; missing inputs fail.
pub(crate) fn check(name: &str, outcome: Option<bool>) -> Criterion {
    match outcome {
        Some(passed) => Criterion::new(name, passed),
        None => Criterion::new(name, false).with_detail("n/a"),
    }
}
