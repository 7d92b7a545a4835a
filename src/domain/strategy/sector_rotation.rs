//! Sector rotation: meant for a universe of sector funds. Each symbol is
//! rebased against the benchmark over `lookback` bars; outperformers pass
//! and rank by that ratio. A volume surge over the recent average adds to
//! the score without being required.

use super::{EvalContext, Strategy, check, prepare, read_period, read_positive};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::signals::relative_performance;
use crate::domain::verdict::Verdict;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "sector_rotation";

#[derive(Debug, Clone, PartialEq)]
pub struct SectorRotationParams {
    pub lookback: usize,
    pub volume_period: usize,
    /// Relative performance must exceed this; 1.0 means "beat the benchmark".
    pub min_ratio: f64,
}

impl Default for SectorRotationParams {
    fn default() -> Self {
        Self {
            lookback: 63,
            volume_period: 20,
            min_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectorRotation {
    params: SectorRotationParams,
}

impl SectorRotation {
    pub fn new(params: SectorRotationParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = SectorRotationParams::default();
        let lookback = read_period(config, SECTION, "lookback", d.lookback)?;
        if lookback < 2 {
            return Err(ScreenerError::invalid(
                SECTION,
                "lookback",
                "lookback must be at least 2",
            ));
        }
        Ok(Self::new(SectorRotationParams {
            lookback,
            volume_period: read_period(config, SECTION, "volume_period", d.volume_period)?,
            min_ratio: read_positive(config, SECTION, "min_ratio", d.min_ratio)?,
        }))
    }
}

impl Strategy for SectorRotation {
    fn name(&self) -> &'static str {
        "sector_rotation"
    }

    fn min_bars(&self) -> usize {
        self.params.lookback.max(self.params.volume_period)
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::VolumeSma(self.params.volume_period)]
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;

        let ratio = ctx
            .benchmark
            .and_then(|b| relative_performance(ctx.bars, b, p.lookback));
        let volume = ctx.bars[prep.last].volume as f64;
        let surge = prep
            .last(IndicatorType::VolumeSma(p.volume_period))
            .filter(|&avg| avg > 0.0)
            .map(|avg| 100.0 * volume / avg);
        if let Some(r) = ratio {
            prep.readings.insert_value("rs_ratio", r);
        }
        if let Some(s) = surge {
            prep.readings.insert_value("volume_surge_pct", s);
        }

        let outperforms = ratio.map(|r| r > p.min_ratio);
        let criteria = vec![
            check("outperforms_benchmark", outperforms),
            check("volume_surge", surge.map(|s| s > 100.0)),
        ];
        Ok(Verdict::with_pass_rule(
            self.name(),
            prep.readings,
            criteria,
            outperforms == Some(true),
        ))
    }

    fn rank_by(&self) -> Option<&'static str> {
        Some("rs_ratio")
    }

    fn describe(&self) -> String {
        format!(
            "{}-bar performance vs benchmark > {:.2}, volume vs {}-bar average",
            self.params.lookback, self.params.min_ratio, self.params.volume_period
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{MapConfig, bars_from_closes, linear_closes};
    use approx::assert_relative_eq;

    fn small() -> SectorRotation {
        SectorRotation::new(SectorRotationParams {
            lookback: 5,
            volume_period: 3,
            min_ratio: 1.0,
        })
    }

    #[test]
    fn outperformer_passes_with_volume_surge() {
        let mut bars = bars_from_closes(&linear_closes(6, 100.0, 5.0));
        bars[5].volume = 3_000_000;
        let market = bars_from_closes(&linear_closes(6, 100.0, 1.0));
        let ctx = EvalContext::new("XLK", &bars).with_benchmark(&market);
        let v = small().evaluate(&ctx).unwrap();
        assert!(v.passed);
        assert_relative_eq!(v.score, 100.0);
        // symbol 105 -> 125, market 101 -> 105
        assert_relative_eq!(
            v.readings.value("rs_ratio").unwrap(),
            (125.0 / 105.0) / (105.0 / 101.0),
            epsilon = 1e-12
        );
        // 3M against an average of (1M + 1M + 3M) / 3
        assert_relative_eq!(v.readings.value("volume_surge_pct").unwrap(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn quiet_outperformer_still_passes_on_a_lower_score() {
        let bars = bars_from_closes(&linear_closes(6, 100.0, 5.0));
        let market = bars_from_closes(&linear_closes(6, 100.0, 1.0));
        let ctx = EvalContext::new("XLK", &bars).with_benchmark(&market);
        let v = small().evaluate(&ctx).unwrap();
        assert!(v.passed);
        assert_relative_eq!(v.score, 50.0);
    }

    #[test]
    fn laggard_fails() {
        let bars = bars_from_closes(&linear_closes(6, 100.0, 0.5));
        let market = bars_from_closes(&linear_closes(6, 100.0, 2.0));
        let ctx = EvalContext::new("XLU", &bars).with_benchmark(&market);
        let v = small().evaluate(&ctx).unwrap();
        assert!(!v.passed);
        assert!(v.readings.value("rs_ratio").unwrap() < 1.0);
    }

    #[test]
    fn missing_benchmark_fails() {
        let bars = bars_from_closes(&linear_closes(6, 100.0, 5.0));
        let v = small().evaluate(&EvalContext::new("XLK", &bars)).unwrap();
        assert!(!v.passed);
        let failed = v.failed_criteria().next().unwrap();
        assert_eq!(failed.name, "outperforms_benchmark");
        assert_eq!(failed.detail.as_deref(), Some("n/a"));
    }

    #[test]
    fn lookback_of_one_is_rejected() {
        let config = MapConfig::new().set("sector_rotation", "lookback", "1");
        assert!(SectorRotation::from_config(&config).is_err());
        assert_eq!(
            SectorRotation::from_config(&MapConfig::new()).unwrap().min_bars(),
            63
        );
    }
}
