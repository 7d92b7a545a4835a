//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, simple_point};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = rolling_mean(&closes, period)
        .into_iter()
        .zip(bars)
        .map(|(mean, bar)| simple_point(bar.date, mean.is_some(), mean.unwrap_or(0.0)))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

/// Rolling mean over `period` values; `None` during warm-up.
/// Returns an empty vector for a zero period.
pub(crate) fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, v) in values.iter().enumerate() {
        sum += v;
        if i >= period {
            sum -= values[i - period];
        }
        if i + 1 >= period {
            out.push(Some(sum / period as f64));
        } else {
            out.push(None);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn sma_warmup() {
        let series = calculate_sma(&make_bars(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn sma_values() {
        let series = calculate_sma(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);
        assert_relative_eq!(series.simple_at(2).unwrap(), 20.0);
        assert_relative_eq!(series.simple_at(3).unwrap(), 30.0);
        assert_relative_eq!(series.simple_at(4).unwrap(), 40.0);
    }

    #[test]
    fn sma_period_longer_than_data() {
        let series = calculate_sma(&make_bars(&[1.0, 2.0]), 5);
        assert_eq!(series.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn sma_period_0() {
        let series = calculate_sma(&make_bars(&[1.0, 2.0]), 0);
        assert!(series.is_empty());
    }

    #[test]
    fn sma_indicator_type() {
        let series = calculate_sma(&make_bars(&[1.0]), 50);
        assert_eq!(series.indicator_type, IndicatorType::Sma(50));
    }

    proptest! {
        #[test]
        fn sma_of_constant_is_constant(price in 1.0f64..1_000.0, len in 1usize..80, period in 1usize..30) {
            let bars = make_bars(&vec![price; len]);
            let series = calculate_sma(&bars, period);
            prop_assert_eq!(series.len(), len);
            for (_, v) in series.valid_simple() {
                prop_assert!((v - price).abs() < 1e-9 * price.max(1.0));
            }
        }
    }
}
