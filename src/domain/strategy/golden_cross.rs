//! Golden cross: the fast SMA crossed above the slow SMA recently.

use super::{EvalContext, Strategy, check, ensure_shorter, prepare, read_period};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::days_before;
use crate::domain::signals::last_cross_above_since;
use crate::domain::verdict::{Criterion, Verdict};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "golden_cross";

#[derive(Debug, Clone, PartialEq)]
pub struct GoldenCrossParams {
    pub fast_period: usize,
    pub slow_period: usize,
    /// Calendar days before the evaluation date in which the cross counts.
    pub recent_days: usize,
}

impl Default for GoldenCrossParams {
    fn default() -> Self {
        Self {
            fast_period: 50,
            slow_period: 200,
            recent_days: 7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoldenCross {
    params: GoldenCrossParams,
}

impl GoldenCross {
    pub fn new(params: GoldenCrossParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = GoldenCrossParams::default();
        let params = GoldenCrossParams {
            fast_period: read_period(config, SECTION, "fast_period", d.fast_period)?,
            slow_period: read_period(config, SECTION, "slow_period", d.slow_period)?,
            recent_days: read_period(config, SECTION, "recent_days", d.recent_days)?,
        };
        ensure_shorter(
            SECTION,
            "fast_period",
            params.fast_period,
            "slow_period",
            params.slow_period,
        )?;
        Ok(Self::new(params))
    }
}

impl Strategy for GoldenCross {
    fn name(&self) -> &'static str {
        "golden_cross"
    }

    fn min_bars(&self) -> usize {
        self.params.slow_period
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Sma(self.params.fast_period),
            IndicatorType::Sma(self.params.slow_period),
        ]
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let fast_type = IndicatorType::Sma(p.fast_period);
        let slow_type = IndicatorType::Sma(p.slow_period);

        let since = days_before(ctx.bars[prep.last].date, p.recent_days);
        let cross = match (prep.series(fast_type), prep.series(slow_type)) {
            (Some(fast), Some(slow)) => last_cross_above_since(ctx.bars, fast, slow, since),
            _ => None,
        };
        prep.readings.insert_flag("golden_cross", cross.is_some());

        let cross_criterion = match cross {
            Some(i) => Criterion::new("recent_cross", true)
                .with_detail(format!("crossed on {}", ctx.bars[i].date)),
            None => Criterion::new("recent_cross", false)
                .with_detail(format!("no cross since {since}")),
        };
        let above = prep
            .last(fast_type)
            .zip(prep.last(slow_type))
            .map(|(f, s)| f > s);

        let criteria = vec![cross_criterion, check("fast_above_slow", above)];
        Ok(Verdict::from_criteria(self.name(), prep.readings, criteria))
    }

    fn describe(&self) -> String {
        format!(
            "SMA({}) crossed above SMA({}) within {} days",
            self.params.fast_period, self.params.slow_period, self.params.recent_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{MapConfig, bars_from_closes};
    use approx::assert_relative_eq;

    fn small() -> GoldenCross {
        GoldenCross::new(GoldenCrossParams {
            fast_period: 2,
            slow_period: 4,
            recent_days: 7,
        })
    }

    fn cross_on_last_bar() -> Vec<f64> {
        let mut closes = vec![10.0; 10];
        closes.extend([9.0; 5]);
        closes.push(20.0);
        closes
    }

    #[test]
    fn huge_recent_window_counts_any_cross() {
        let config = MapConfig::new()
            .set(SECTION, "fast_period", "2")
            .set(SECTION, "slow_period", "4")
            .set(SECTION, "recent_days", "1000000000");
        let strategy = GoldenCross::from_config(&config).unwrap();
        let bars = bars_from_closes(&cross_on_last_bar());
        let verdict = strategy.evaluate(&EvalContext::new("TEST", &bars)).unwrap();
        assert_eq!(verdict.readings.flag("golden_cross"), Some(true));
    }

    #[test]
    fn fresh_cross_passes() {
        let bars = bars_from_closes(&cross_on_last_bar());
        let verdict = small().evaluate(&EvalContext::new("TEST", &bars)).unwrap();
        assert!(verdict.passed, "{:?}", verdict.criteria);
        assert_eq!(verdict.readings.flag("golden_cross"), Some(true));
        let detail = verdict.criteria[0].detail.as_deref().unwrap();
        assert!(detail.contains(&bars.last().unwrap().date.to_string()));
    }

    #[test]
    fn stale_cross_fails_recency() {
        let mut closes = cross_on_last_bar();
        closes.extend((1..=10).map(|i| 20.0 + i as f64));
        let bars = bars_from_closes(&closes);
        let verdict = small().evaluate(&EvalContext::new("TEST", &bars)).unwrap();
        assert!(!verdict.passed);
        assert!(!verdict.criteria[0].passed);
        assert!(verdict.criteria[1].passed);
        assert_relative_eq!(verdict.score, 50.0);
    }

    #[test]
    fn cross_within_window_still_counts() {
        let mut closes = cross_on_last_bar();
        closes.extend((1..=7).map(|i| 20.0 + i as f64));
        let bars = bars_from_closes(&closes);
        let verdict = small().evaluate(&EvalContext::new("TEST", &bars)).unwrap();
        assert!(verdict.passed);
    }

    #[test]
    fn no_cross_in_flat_series() {
        let bars = bars_from_closes(&[10.0; 20]);
        let verdict = small().evaluate(&EvalContext::new("TEST", &bars)).unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn rejects_inverted_periods() {
        let config = MapConfig::new()
            .set(SECTION, "fast_period", "200")
            .set(SECTION, "slow_period", "50");
        assert!(GoldenCross::from_config(&config).is_err());
    }
}
