//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Values are recursive from the first bar; the first (n-1) bars are flagged invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, simple_point};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = ema_values(&closes, period)
        .into_iter()
        .zip(bars)
        .enumerate()
        .map(|(i, (ema, bar))| simple_point(bar.date, i + 1 >= period, ema))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// Raw recursive EMA over `values`. Empty for a zero period.
pub(crate) fn ema_values(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);
    for v in &values[1..] {
        ema = v * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;

    #[test]
    fn ema_warmup() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]), 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn ema_period_1_tracks_close() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0]), 1);
        assert_relative_eq!(series.simple_at(0).unwrap(), 10.0);
        assert_relative_eq!(series.simple_at(1).unwrap(), 20.0);
        assert_relative_eq!(series.simple_at(2).unwrap(), 30.0);
    }

    #[test]
    fn ema_seeded_with_first_close() {
        let raw = ema_values(&[10.0, 20.0, 30.0], 3);
        let k = 0.5;
        assert_relative_eq!(raw[0], 10.0);
        assert_relative_eq!(raw[1], 20.0 * k + 10.0 * (1.0 - k));
        assert_relative_eq!(raw[2], 30.0 * k + raw[1] * (1.0 - k));
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0, 40.0]), 3);
        // 10 -> 15 -> 22.5 -> 31.25
        assert_relative_eq!(series.simple_at(2).unwrap(), 22.5);
        assert_relative_eq!(series.simple_at(3).unwrap(), 31.25);
    }

    #[test]
    fn ema_equal_prices() {
        let series = calculate_ema(&make_bars(&[100.0; 5]), 3);
        for i in 2..5 {
            assert_relative_eq!(series.simple_at(i).unwrap(), 100.0);
        }
    }

    #[test]
    fn ema_empty_bars() {
        let series = calculate_ema(&[], 3);
        assert!(series.is_empty());
    }

    #[test]
    fn ema_period_0() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0]), 0);
        assert!(series.is_empty());
    }
}
