//! CANSLIM growth screen.
//!
//! Combines a market gate (benchmark in an uptrend), earnings growth, price
//! near its yearly high, a volume surge, relative strength against the
//! benchmark and institutional sponsorship.

use super::{
    EvalContext, Strategy, check, ensure_shorter, prepare, read_fraction, read_non_negative,
    read_number, read_period,
};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_engine::compute_indicators;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signals::relative_strength;
use crate::domain::verdict::{Criterion, Verdict};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "canslim";

#[derive(Debug, Clone, PartialEq)]
pub struct CanslimParams {
    pub high_fraction: f64,
    pub range_window: usize,
    pub volume_short: usize,
    pub volume_long: usize,
    pub volume_increase_pct: f64,
    pub rs_period: usize,
    pub rs_min: f64,
    pub quarterly_growth_min: f64,
    pub annual_growth_min: f64,
    pub institutional_value_min: f64,
    pub reputable_min: usize,
    pub market_fast: usize,
    pub market_slow: usize,
}

impl Default for CanslimParams {
    fn default() -> Self {
        Self {
            high_fraction: 0.90,
            range_window: 252,
            volume_short: 20,
            volume_long: 50,
            volume_increase_pct: 15.0,
            rs_period: 120,
            rs_min: 0.5,
            quarterly_growth_min: 25.0,
            annual_growth_min: 25.0,
            institutional_value_min: 1e9,
            reputable_min: 2,
            market_fast: 50,
            market_slow: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Canslim {
    params: CanslimParams,
}

impl Canslim {
    pub fn new(params: CanslimParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = CanslimParams::default();
        let reputable_min: i64 = read_number(config, SECTION, "reputable_min", d.reputable_min as i64)?;
        if reputable_min < 0 {
            return Err(ScreenerError::invalid(
                SECTION,
                "reputable_min",
                "reputable_min must be non-negative",
            ));
        }
        let params = CanslimParams {
            high_fraction: read_fraction(config, SECTION, "high_fraction", d.high_fraction)?,
            range_window: read_period(config, SECTION, "range_window", d.range_window)?,
            volume_short: read_period(config, SECTION, "volume_short", d.volume_short)?,
            volume_long: read_period(config, SECTION, "volume_long", d.volume_long)?,
            volume_increase_pct: read_number(
                config,
                SECTION,
                "volume_increase_pct",
                d.volume_increase_pct,
            )?,
            rs_period: read_period(config, SECTION, "rs_period", d.rs_period)?,
            rs_min: read_non_negative(config, SECTION, "rs_min", d.rs_min)?,
            quarterly_growth_min: read_number(
                config,
                SECTION,
                "quarterly_growth_min",
                d.quarterly_growth_min,
            )?,
            annual_growth_min: read_number(config, SECTION, "annual_growth_min", d.annual_growth_min)?,
            institutional_value_min: read_non_negative(
                config,
                SECTION,
                "institutional_value_min",
                d.institutional_value_min,
            )?,
            reputable_min: reputable_min as usize,
            market_fast: read_period(config, SECTION, "market_fast", d.market_fast)?,
            market_slow: read_period(config, SECTION, "market_slow", d.market_slow)?,
        };
        ensure_shorter(
            SECTION,
            "volume_short",
            params.volume_short,
            "volume_long",
            params.volume_long,
        )?;
        ensure_shorter(
            SECTION,
            "market_fast",
            params.market_fast,
            "market_slow",
            params.market_slow,
        )?;
        Ok(Self::new(params))
    }

    /// Benchmark SMA(fast) above SMA(slow) on its last bar.
    fn market_uptrend(&self, benchmark: Option<&[OhlcvBar]>) -> Option<bool> {
        let bars = benchmark?;
        let fast_type = IndicatorType::Sma(self.params.market_fast);
        let slow_type = IndicatorType::Sma(self.params.market_slow);
        let computed = compute_indicators(bars, &[fast_type, slow_type]);
        let fast = computed.get(&fast_type)?.last_simple()?;
        let slow = computed.get(&slow_type)?.last_simple()?;
        Some(fast > slow)
    }

    /// Percent change of the recent volume mean over the mean of the bars
    /// just before it.
    fn volume_change_pct(&self, recent: Option<f64>, long: Option<f64>) -> Option<f64> {
        let p = &self.params;
        let recent = recent?;
        let long = long?;
        let prior_len = (p.volume_long - p.volume_short) as f64;
        let prior = (long * p.volume_long as f64 - recent * p.volume_short as f64) / prior_len;
        if prior <= 0.0 {
            return None;
        }
        Some((recent - prior) / prior * 100.0)
    }
}

impl Strategy for Canslim {
    fn name(&self) -> &'static str {
        "canslim"
    }

    fn min_bars(&self) -> usize {
        let p = &self.params;
        p.market_slow.max(p.volume_long).max(p.rs_period)
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        let p = &self.params;
        vec![
            IndicatorType::Highest(p.range_window),
            IndicatorType::VolumeSma(p.volume_short),
            IndicatorType::VolumeSma(p.volume_long),
        ]
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let close = ctx.bars[prep.last].close;

        let market = self.market_uptrend(ctx.benchmark);
        let high = prep.last(IndicatorType::Highest(p.range_window));
        let volume_change = self.volume_change_pct(
            prep.last(IndicatorType::VolumeSma(p.volume_short)),
            prep.last(IndicatorType::VolumeSma(p.volume_long)),
        );
        let rs = ctx
            .benchmark
            .and_then(|b| relative_strength(ctx.bars, b, p.rs_period));

        if let Some(v) = volume_change {
            prep.readings.insert_value("volume_change_pct", v);
        }
        if let Some(rs) = rs {
            prep.readings.insert_value("relative_strength", rs);
        }
        if let Some(m) = market {
            prep.readings.insert_flag("market_uptrend", m);
        }

        let mut criteria: Vec<Criterion> = vec![check("market_uptrend", market)];

        match ctx.fundamentals {
            Some(f) => {
                let quarterly = f.quarterly_growth();
                let annual = f.annual_growth();
                let holders = f.institutional_summary();
                if let Some(q) = quarterly {
                    prep.readings.insert_value("quarterly_growth_pct", q);
                }
                if let Some(a) = annual {
                    prep.readings.insert_value("annual_growth_pct", a);
                }
                prep.readings
                    .insert_value("institutional_value", holders.total_value);
                prep.readings
                    .insert_value("reputable_holders", holders.reputable_count() as f64);

                criteria.push(check(
                    "quarterly_growth",
                    quarterly.map(|q| q >= p.quarterly_growth_min),
                ));
                criteria.push(match annual {
                    Some(a) => Criterion::new("annual_growth", a >= p.annual_growth_min),
                    None => Criterion::new("annual_growth", true).with_detail("unknown"),
                });
                criteria.push(Criterion::new(
                    "institutional_value",
                    holders.total_value >= p.institutional_value_min,
                ));
                criteria.push(
                    Criterion::new(
                        "reputable_holders",
                        holders.reputable_count() >= p.reputable_min,
                    )
                    .with_detail(holders.reputable.join("; ")),
                );
            }
            None => {
                for name in [
                    "quarterly_growth",
                    "annual_growth",
                    "institutional_value",
                    "reputable_holders",
                ] {
                    criteria.push(Criterion::new(name, false).with_detail("no fundamentals"));
                }
            }
        }

        criteria.push(check(
            "near_range_high",
            high.map(|h| close >= p.high_fraction * h),
        ));
        criteria.push(check(
            "volume_surge",
            volume_change.map(|v| v >= p.volume_increase_pct),
        ));
        criteria.push(check("relative_strength", rs.map(|r| r >= p.rs_min)));

        Ok(Verdict::from_criteria(self.name(), prep.readings, criteria))
    }

    fn describe(&self) -> String {
        let p = &self.params;
        format!(
            "market SMA({}) > SMA({}), EPS growth q>={}% y>={}%, close >= {}x {}-bar high, \
             volume +{}% ({} vs {}), RS({}) >= {}, institutions >= {} with {} reputable",
            p.market_fast,
            p.market_slow,
            p.quarterly_growth_min,
            p.annual_growth_min,
            p.high_fraction,
            p.range_window,
            p.volume_increase_pct,
            p.volume_short,
            p.volume_long,
            p.rs_period,
            p.rs_min,
            p.institutional_value_min,
            p.reputable_min
        )
    }
}
