//! Derived signals over indicator series: crossovers, slopes and ratios.
//!
//! Helpers return `None` instead of guessing whenever an input point is
//! missing or still in warm-up.

use crate::domain::indicator::IndicatorSeries;
use crate::domain::ohlcv::{OhlcvBar, index_on_or_before};
use chrono::NaiveDate;

/// `fast` moved from at-or-below `slow` to strictly above it at `index`.
pub fn crossed_above(fast: &IndicatorSeries, slow: &IndicatorSeries, index: usize) -> bool {
    if index == 0 {
        return false;
    }
    match (
        fast.simple_at(index - 1),
        slow.simple_at(index - 1),
        fast.simple_at(index),
        slow.simple_at(index),
    ) {
        (Some(fp), Some(sp), Some(fc), Some(sc)) => fp <= sp && fc > sc,
        _ => false,
    }
}

/// `fast` moved from at-or-above `slow` to strictly below it at `index`.
pub fn crossed_below(fast: &IndicatorSeries, slow: &IndicatorSeries, index: usize) -> bool {
    if index == 0 {
        return false;
    }
    match (
        fast.simple_at(index - 1),
        slow.simple_at(index - 1),
        fast.simple_at(index),
        slow.simple_at(index),
    ) {
        (Some(fp), Some(sp), Some(fc), Some(sc)) => fp >= sp && fc < sc,
        _ => false,
    }
}

/// Index of the most recent upward cross dated on or after `since`.
pub fn last_cross_above_since(
    bars: &[OhlcvBar],
    fast: &IndicatorSeries,
    slow: &IndicatorSeries,
    since: NaiveDate,
) -> Option<usize> {
    (1..bars.len())
        .rev()
        .take_while(|&i| bars[i].date >= since)
        .find(|&i| crossed_above(fast, slow, i))
}

/// Least-squares slope of `values` against 0, 1, 2, ...
pub fn linear_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    Some(num / den)
}

/// Percent change from `from` to `to`. `None` when `from` is zero.
pub fn pct_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 {
        None
    } else {
        Some((to / from - 1.0) * 100.0)
    }
}

pub fn strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// Gains of `bars` and the benchmark over the last `period` bars (as
/// fractions). The window starts `period` bars from the end, inclusive of
/// the last bar; the benchmark uses its bars on or before the window's first
/// and last dates.
fn window_gains(bars: &[OhlcvBar], benchmark: &[OhlcvBar], period: usize) -> Option<(f64, f64)> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let first = &bars[bars.len() - period];
    let last = &bars[bars.len() - 1];
    let bench_first = &benchmark[index_on_or_before(benchmark, first.date)?];
    let bench_last = &benchmark[index_on_or_before(benchmark, last.date)?];
    let gain = |start: f64, end: f64| (start != 0.0).then(|| end / start - 1.0);
    Some((
        gain(first.close, last.close)?,
        gain(bench_first.close, bench_last.close)?,
    ))
}

/// Gain of `bars` over the last `period` bars divided by the benchmark's gain
/// over the same dates.
pub fn relative_strength(bars: &[OhlcvBar], benchmark: &[OhlcvBar], period: usize) -> Option<f64> {
    let (symbol_gain, market_gain) = window_gains(bars, benchmark, period)?;
    if market_gain == 0.0 {
        return None;
    }
    Some(symbol_gain / market_gain)
}

/// Both series rebased to 1 at the window start; the symbol's level over
/// the benchmark's at the end. Above 1 means the symbol outperformed.
pub fn relative_performance(
    bars: &[OhlcvBar],
    benchmark: &[OhlcvBar],
    period: usize,
) -> Option<f64> {
    let (symbol_gain, market_gain) = window_gains(bars, benchmark, period)?;
    let market_level = 1.0 + market_gain;
    (market_level != 0.0).then(|| (1.0 + symbol_gain) / market_level)
}

/// Sample standard deviation of the last `window` close-to-close returns
/// (as fractions). Needs `window + 1` bars and a window of at least 2.
pub fn return_volatility(bars: &[OhlcvBar], window: usize) -> Option<f64> {
    if window < 2 || bars.len() < window + 1 {
        return None;
    }
    let tail = &bars[bars.len() - window - 1..];
    let returns: Vec<f64> = tail
        .windows(2)
        .map(|w| (w[0].close != 0.0).then(|| w[1].close / w[0].close - 1.0))
        .collect::<Option<_>>()?;
    let mean = returns.iter().sum::<f64>() / window as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
    Some(variance.sqrt())
}

/// Last `n` valid values of a simple series, oldest first.
pub fn tail_valid(series: &IndicatorSeries, n: usize) -> Vec<f64> {
    let valid = series.valid_simple();
    let start = valid.len().saturating_sub(n);
    valid[start..].iter().map(|&(_, v)| v).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::calculate_sma;
    use crate::domain::indicator::test_support::make_bars;
    use approx::assert_relative_eq;

    #[test]
    fn cross_above_detected_once() {
        // SMA(1) is the close; SMA(3) lags, so the V bottom produces one cross.
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 8.0, 10.0, 12.0]);
        let fast = calculate_sma(&bars, 1);
        let slow = calculate_sma(&bars, 3);
        let crosses: Vec<usize> = (0..bars.len())
            .filter(|&i| crossed_above(&fast, &slow, i))
            .collect();
        assert_eq!(crosses, vec![4]);
        assert!((0..bars.len()).all(|i| !crossed_below(&fast, &slow, i)));
    }

    #[test]
    fn cross_requires_valid_previous_point() {
        let bars = make_bars(&[1.0, 5.0, 9.0]);
        let fast = calculate_sma(&bars, 1);
        let slow = calculate_sma(&bars, 2);
        // slow is invalid at 0, so no cross can be reported at 1
        assert!(!crossed_above(&fast, &slow, 1));
        assert!(!crossed_above(&fast, &slow, 0));
    }

    #[test]
    fn cross_below_detected() {
        let bars = make_bars(&[7.0, 8.0, 9.0, 10.0, 8.0, 6.0]);
        let fast = calculate_sma(&bars, 1);
        let slow = calculate_sma(&bars, 3);
        assert!(crossed_below(&fast, &slow, 4));
    }

    #[test]
    fn last_cross_respects_window() {
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 8.0, 10.0, 12.0]);
        let fast = calculate_sma(&bars, 1);
        let slow = calculate_sma(&bars, 3);
        assert_eq!(last_cross_above_since(&bars, &fast, &slow, bars[2].date), Some(4));
        assert_eq!(last_cross_above_since(&bars, &fast, &slow, bars[5].date), None);
    }

    #[test]
    fn slope_of_line() {
        assert_relative_eq!(linear_slope(&[1.0, 3.0, 5.0, 7.0]).unwrap(), 2.0);
        assert_relative_eq!(linear_slope(&[4.0, 4.0, 4.0]).unwrap(), 0.0);
        assert!(linear_slope(&[1.0]).is_none());
    }

    #[test]
    fn slope_of_noisy_series() {
        // y = 2, 1, 4, 3 => slope 0.6
        assert_relative_eq!(linear_slope(&[2.0, 1.0, 4.0, 3.0]).unwrap(), 0.6, epsilon = 1e-12);
    }

    #[test]
    fn pct_change_values() {
        assert_relative_eq!(pct_change(100.0, 101.5).unwrap(), 1.5, epsilon = 1e-12);
        assert!(pct_change(0.0, 1.0).is_none());
    }

    #[test]
    fn strictly_increasing_rejects_flat() {
        assert!(strictly_increasing(&[1.0, 2.0, 3.0]));
        assert!(!strictly_increasing(&[1.0, 2.0, 2.0]));
        assert!(strictly_increasing(&[]));
    }

    #[test]
    fn relative_strength_ratio() {
        let symbol = make_bars(&[100.0, 110.0, 120.0]);
        let market = make_bars(&[50.0, 52.0, 55.0]);
        // symbol +20%, market +10% over 3 bars
        assert_relative_eq!(relative_strength(&symbol, &market, 3).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn relative_strength_undefined_cases() {
        let symbol = make_bars(&[100.0, 110.0, 120.0]);
        let flat = make_bars(&[50.0, 51.0, 50.0]);
        assert!(relative_strength(&symbol, &flat, 3).is_none());
        assert!(relative_strength(&symbol, &flat, 10).is_none());
    }

    #[test]
    fn relative_strength_uses_benchmark_on_symbol_dates() {
        let symbol = make_bars(&[100.0, 110.0, 120.0]);
        // Same first three dates, then the market collapses after the
        // symbol's last bar.
        let market = make_bars(&[50.0, 52.0, 55.0, 30.0, 20.0]);
        assert_relative_eq!(relative_strength(&symbol, &market, 3).unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn relative_strength_needs_benchmark_at_window_start() {
        let symbol = make_bars(&[100.0, 110.0, 120.0]);
        let market: Vec<OhlcvBar> = make_bars(&[50.0, 52.0, 55.0]).into_iter().skip(1).collect();
        assert!(relative_strength(&symbol, &market, 3).is_none());
    }

    #[test]
    fn relative_performance_rebases_both_series() {
        let symbol = make_bars(&[100.0, 110.0, 120.0]);
        let market = make_bars(&[50.0, 52.0, 50.0, 10.0]);
        // 1.20 against a flat market, where the gain ratio is undefined
        assert_relative_eq!(relative_performance(&symbol, &market, 3).unwrap(), 1.2, epsilon = 1e-12);
        assert!(relative_strength(&symbol, &market, 3).is_none());
        let falling = make_bars(&[100.0, 95.0, 90.0]);
        assert!(relative_performance(&falling, &market, 3).unwrap() < 1.0);
    }

    #[test]
    fn return_volatility_of_alternating_moves() {
        // Returns: +10%, -10%, +10% => mean 1/30, sample std 0.11547
        let bars = make_bars(&[100.0, 110.0, 99.0, 108.9]);
        assert_relative_eq!(return_volatility(&bars, 3).unwrap(), 0.115_470_053_837_925_15, epsilon = 1e-9);
        assert!(return_volatility(&bars, 4).is_none());
        assert!(return_volatility(&bars, 1).is_none());
        let steady = make_bars(&[100.0, 101.0, 102.01, 103.0301]);
        assert_relative_eq!(return_volatility(&steady, 3).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn tail_valid_skips_warmup() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let sma = calculate_sma(&bars, 2);
        assert_eq!(tail_valid(&sma, 2), vec![2.5, 3.5]);
        assert_eq!(tail_valid(&sma, 10), vec![1.5, 2.5, 3.5]);
    }
}
