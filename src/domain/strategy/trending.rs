//! Trending: heavy volume on the last bar together with a large one-day move
//! in either direction. Verdicts rank by the signed move, biggest gain first.

use super::{EvalContext, Strategy, check, prepare, read_non_negative};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::signals::pct_change;
use crate::domain::verdict::{Criterion, Verdict};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "trending";

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingParams {
    /// Last-bar volume must exceed this.
    pub min_volume: f64,
    /// Absolute close-to-close change, in percent, must exceed this.
    pub min_change_pct: f64,
}

impl Default for TrendingParams {
    fn default() -> Self {
        Self {
            min_volume: 1_000_000.0,
            min_change_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Trending {
    params: TrendingParams,
}

impl Trending {
    pub fn new(params: TrendingParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = TrendingParams::default();
        Ok(Self::new(TrendingParams {
            min_volume: read_non_negative(config, SECTION, "min_volume", d.min_volume)?,
            min_change_pct: read_non_negative(config, SECTION, "min_change_pct", d.min_change_pct)?,
        }))
    }
}

impl Strategy for Trending {
    fn name(&self) -> &'static str {
        "trending"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let last = &ctx.bars[prep.last];
        let previous = &ctx.bars[prep.last - 1];

        let change = pct_change(previous.close, last.close);
        let volume = last.volume as f64;
        prep.readings.insert_value("volume", volume);
        if let Some(c) = change {
            prep.readings.insert_value("change_pct", c);
        }

        let heavy = Criterion::new("heavy_volume", volume > p.min_volume)
            .with_detail(format!("volume {} vs {}", last.volume, p.min_volume));
        let criteria = vec![
            heavy,
            check("big_move", change.map(|c| c.abs() > p.min_change_pct)),
        ];
        Ok(Verdict::from_criteria(self.name(), prep.readings, criteria))
    }

    fn rank_by(&self) -> Option<&'static str> {
        Some("change_pct")
    }

    fn describe(&self) -> String {
        format!(
            "volume > {} and |1-day change| > {}%",
            self.params.min_volume, self.params.min_change_pct
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{MapConfig, bars_from_closes};
    use approx::assert_relative_eq;

    fn with_volume(closes: &[f64], volume: i64) -> Vec<crate::domain::ohlcv::OhlcvBar> {
        bars_from_closes(closes)
            .into_iter()
            .map(|mut b| {
                b.volume = volume;
                b
            })
            .collect()
    }

    #[test]
    fn heavy_drop_counts_as_trending() {
        let bars = with_volume(&[100.0, 101.0, 97.0], 2_500_000);
        let v = Trending::new(TrendingParams::default())
            .evaluate(&EvalContext::new("TEST", &bars))
            .unwrap();
        assert!(v.passed);
        assert_relative_eq!(v.readings.value("change_pct").unwrap(), -3.960_396, epsilon = 1e-5);
        assert_relative_eq!(v.readings.value("volume").unwrap(), 2_500_000.0);
    }

    #[test]
    fn small_move_or_thin_volume_fails() {
        let strategy = Trending::new(TrendingParams::default());
        let quiet = with_volume(&[100.0, 101.0], 5_000_000);
        let v = strategy.evaluate(&EvalContext::new("TEST", &quiet)).unwrap();
        assert!(!v.passed);
        assert_eq!(v.failed_criteria().next().unwrap().name, "big_move");

        // the volume must be strictly above the threshold
        let thin = with_volume(&[100.0, 110.0], 1_000_000);
        let v = strategy.evaluate(&EvalContext::new("TEST", &thin)).unwrap();
        assert!(!v.passed);
        assert_eq!(v.failed_criteria().next().unwrap().name, "heavy_volume");
    }

    #[test]
    fn zero_previous_close_is_not_a_move() {
        let bars = with_volume(&[0.0, 10.0], 5_000_000);
        let v = Trending::new(TrendingParams::default())
            .evaluate(&EvalContext::new("TEST", &bars))
            .unwrap();
        assert!(!v.passed);
        assert!(v.readings.value("change_pct").is_none());
    }

    #[test]
    fn thresholds_from_config() {
        let config = MapConfig::new()
            .set("trending", "min_volume", "100")
            .set("trending", "min_change_pct", "0.5");
        let bars = with_volume(&[100.0, 101.0], 500);
        let v = Trending::from_config(&config)
            .unwrap()
            .evaluate(&EvalContext::new("TEST", &bars))
            .unwrap();
        assert!(v.passed);

        let bad = MapConfig::new().set("trending", "min_change_pct", "-1");
        assert!(matches!(
            Trending::from_config(&bad),
            Err(ScreenerError::ConfigInvalid { key, .. }) if key == "min_change_pct"
        ));
    }

    #[test]
    fn single_bar_is_insufficient() {
        let bars = with_volume(&[100.0], 5_000_000);
        assert!(matches!(
            Trending::new(TrendingParams::default()).evaluate(&EvalContext::new("TEST", &bars)),
            Err(ScreenerError::InsufficientData { minimum: 2, .. })
        ));
    }
}
