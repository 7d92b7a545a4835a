//! Minervini Stage 2 trend template.
//!
//! A stock is in Stage 2 when price sits above a stacked set of rising
//! moving averages, well off its yearly low, near its yearly high and with
//! strong momentum.

use super::{
    EvalContext, Strategy, check, ensure_shorter, prepare, read_fraction, read_level, read_period,
    read_positive,
};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::verdict::Verdict;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "stage2";

#[derive(Debug, Clone, PartialEq)]
pub struct Stage2Params {
    pub fast_period: usize,
    pub mid_period: usize,
    pub slow_period: usize,
    /// SMA(slow) must exceed its value this many bars earlier.
    pub rising_bars: usize,
    pub rsi_period: usize,
    pub rsi_min: f64,
    pub low_multiple: f64,
    pub high_fraction: f64,
    pub range_window: usize,
}

impl Default for Stage2Params {
    fn default() -> Self {
        Self {
            fast_period: 50,
            mid_period: 150,
            slow_period: 200,
            rising_bars: 4,
            rsi_period: 14,
            rsi_min: 70.0,
            low_multiple: 1.3,
            high_fraction: 0.75,
            range_window: 252,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage2 {
    params: Stage2Params,
}

impl Stage2 {
    pub fn new(params: Stage2Params) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = Stage2Params::default();
        let params = Stage2Params {
            fast_period: read_period(config, SECTION, "fast_period", d.fast_period)?,
            mid_period: read_period(config, SECTION, "mid_period", d.mid_period)?,
            slow_period: read_period(config, SECTION, "slow_period", d.slow_period)?,
            rising_bars: read_period(config, SECTION, "rising_bars", d.rising_bars)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            rsi_min: read_level(config, SECTION, "rsi_min", d.rsi_min)?,
            low_multiple: read_positive(config, SECTION, "low_multiple", d.low_multiple)?,
            high_fraction: read_fraction(config, SECTION, "high_fraction", d.high_fraction)?,
            range_window: read_period(config, SECTION, "range_window", d.range_window)?,
        };
        ensure_shorter(
            SECTION,
            "fast_period",
            params.fast_period,
            "mid_period",
            params.mid_period,
        )?;
        ensure_shorter(
            SECTION,
            "mid_period",
            params.mid_period,
            "slow_period",
            params.slow_period,
        )?;
        Ok(Self::new(params))
    }

    pub fn params(&self) -> &Stage2Params {
        &self.params
    }
}

impl Strategy for Stage2 {
    fn name(&self) -> &'static str {
        "stage2"
    }

    fn min_bars(&self) -> usize {
        let p = &self.params;
        (p.slow_period + p.rising_bars).max(p.rsi_period + 1)
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        let p = &self.params;
        vec![
            IndicatorType::Sma(p.fast_period),
            IndicatorType::Sma(p.mid_period),
            IndicatorType::Sma(p.slow_period),
            IndicatorType::CutlerRsi(p.rsi_period),
            IndicatorType::Highest(p.range_window),
            IndicatorType::Lowest(p.range_window),
        ]
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let close = ctx.bars[prep.last].close;

        let fast = prep.last(IndicatorType::Sma(p.fast_period));
        let mid = prep.last(IndicatorType::Sma(p.mid_period));
        let slow = prep.last(IndicatorType::Sma(p.slow_period));
        let slow_before = prep.back(IndicatorType::Sma(p.slow_period), p.rising_bars);
        let rsi = prep.last(IndicatorType::CutlerRsi(p.rsi_period));
        let high = prep.last(IndicatorType::Highest(p.range_window));
        let low = prep.last(IndicatorType::Lowest(p.range_window));

        let rising = slow.zip(slow_before).map(|(now, then)| now > then);
        if let Some(rising) = rising {
            prep.readings.insert_flag("sma_slow_rising", rising);
        }

        let criteria = vec![
            check(
                "close_above_mid_and_slow",
                mid.zip(slow).map(|(m, s)| close > m && close > s),
            ),
            check("mid_above_slow", mid.zip(slow).map(|(m, s)| m > s)),
            check("slow_rising", rising),
            check(
                "fast_above_mid_and_slow",
                fast.zip(mid)
                    .zip(slow)
                    .map(|((f, m), s)| f > m && f > s),
            ),
            check("close_above_fast", fast.map(|f| close > f)),
            check(
                "above_range_low",
                low.map(|l| close >= p.low_multiple * l),
            ),
            check(
                "near_range_high",
                high.map(|h| close >= p.high_fraction * h),
            ),
            check("rsi_strong", rsi.map(|r| r >= p.rsi_min)),
        ];

        Ok(Verdict::from_criteria(self.name(), prep.readings, criteria))
    }

    fn describe(&self) -> String {
        let p = &self.params;
        format!(
            "SMA {}/{}/{} stacked, SMA({}) rising over {} bars, CUTLER_RSI({}) >= {}, \
             close >= {}x low and >= {}x high of {} bars",
            p.fast_period,
            p.mid_period,
            p.slow_period,
            p.slow_period,
            p.rising_bars,
            p.rsi_period,
            p.rsi_min,
            p.low_multiple,
            p.high_fraction,
            p.range_window
        )
    }
}
