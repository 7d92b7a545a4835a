//! Most traded: the `top_n` symbols by volume summed over the last
//! `window` bars. Volume on bars closing above their open counts as buying,
//! the rest as selling.

use super::{EvalContext, Strategy, prepare, read_period};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::verdict::{Criterion, Verdict};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "most_traded";

#[derive(Debug, Clone, PartialEq)]
pub struct MostTradedParams {
    pub top_n: usize,
    /// Bars whose volume is summed.
    pub window: usize,
}

impl Default for MostTradedParams {
    fn default() -> Self {
        Self {
            top_n: 10,
            window: 1,
        }
    }
}

/// Volume split over a window of bars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSplit {
    pub total: i64,
    pub buy_pct: f64,
    pub sell_pct: f64,
}

impl VolumeSplit {
    pub fn of(bars: &[OhlcvBar]) -> Self {
        let total: i64 = bars.iter().map(|b| b.volume).sum();
        let buying: i64 = bars
            .iter()
            .filter(|b| b.close > b.open)
            .map(|b| b.volume)
            .sum();
        if total <= 0 {
            return Self {
                total,
                buy_pct: 0.0,
                sell_pct: 0.0,
            };
        }
        let buy_pct = 100.0 * buying as f64 / total as f64;
        Self {
            total,
            buy_pct,
            sell_pct: 100.0 - buy_pct,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MostTraded {
    params: MostTradedParams,
}

impl MostTraded {
    pub fn new(params: MostTradedParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = MostTradedParams::default();
        Ok(Self::new(MostTradedParams {
            top_n: read_period(config, SECTION, "top_n", d.top_n)?,
            window: read_period(config, SECTION, "window", d.window)?,
        }))
    }
}

impl Strategy for MostTraded {
    fn name(&self) -> &'static str {
        "most_traded"
    }

    fn min_bars(&self) -> usize {
        self.params.window
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let mut prep = prepare(self, ctx)?;
        let window = &ctx.bars[ctx.bars.len() - self.params.window..];
        let split = VolumeSplit::of(window);
        prep.readings.insert_value("total_volume", split.total as f64);
        prep.readings.insert_value("buy_pct", split.buy_pct);
        prep.readings.insert_value("sell_pct", split.sell_pct);

        let traded = Criterion::new("traded", split.total > 0)
            .with_detail(format!("{} shares over {} bars", split.total, window.len()));
        Ok(Verdict::from_criteria(self.name(), prep.readings, vec![traded]))
    }

    fn rank_by(&self) -> Option<&'static str> {
        Some("total_volume")
    }

    fn keep_top(&self) -> Option<usize> {
        Some(self.params.top_n)
    }

    fn describe(&self) -> String {
        format!(
            "top {} by volume over the last {} bars",
            self.params.top_n, self.params.window
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{MapConfig, bars_from_closes};
    use approx::assert_relative_eq;

    #[test]
    fn split_counts_up_bars_as_buying() {
        let mut bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        bars[0].volume = 100;
        bars[1].volume = 300;
        bars[1].open = 10.5;
        bars[2].volume = 600;
        bars[2].open = 12.5;
        let split = VolumeSplit::of(&bars);
        assert_eq!(split.total, 1000);
        assert_relative_eq!(split.buy_pct, 30.0);
        assert_relative_eq!(split.sell_pct, 70.0);
    }

    #[test]
    fn no_volume_splits_to_zero() {
        let mut bars = bars_from_closes(&[10.0]);
        bars[0].volume = 0;
        let split = VolumeSplit::of(&bars);
        assert_eq!((split.buy_pct, split.sell_pct), (0.0, 0.0));
    }

    #[test]
    fn sums_only_the_window() {
        let mut bars = bars_from_closes(&[10.0, 11.0, 12.0]);
        bars[0].volume = 9_000;
        bars[1].volume = 200;
        bars[2].volume = 300;
        let strategy = MostTraded::from_config(&MapConfig::new().set("most_traded", "window", "2")).unwrap();
        let v = strategy.evaluate(&EvalContext::new("TEST", &bars)).unwrap();
        assert!(v.passed);
        assert_relative_eq!(v.readings.value("total_volume").unwrap(), 500.0);
        assert_eq!(strategy.keep_top(), Some(10));
    }

    #[test]
    fn untraded_symbol_fails() {
        let mut bars = bars_from_closes(&[10.0, 11.0]);
        bars[1].volume = 0;
        let v = MostTraded::new(MostTradedParams::default())
            .evaluate(&EvalContext::new("TEST", &bars))
            .unwrap();
        assert!(!v.passed);
    }

    #[test]
    fn top_n_must_be_positive() {
        let config = MapConfig::new().set("most_traded", "top_n", "0");
        assert!(matches!(
            MostTraded::from_config(&config),
            Err(ScreenerError::ConfigInvalid { key, .. }) if key == "top_n"
        ));
    }
}
