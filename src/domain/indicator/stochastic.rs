//! Stochastic oscillator.
//!
//! %K = 100 × (C - lowest low(k)) / (highest high(k) - lowest low(k))
//! %D = SMA(d) of %K
//!
//! A point is valid once both %K and %D are defined. A flat window
//! (highest high == lowest low) leaves %K undefined for that bar.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stochastic(bars: &[OhlcvBar], k_period: usize, d_period: usize) -> IndicatorSeries {
    let indicator_type = IndicatorType::Stochastic { k_period, d_period };
    if k_period == 0 || d_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let k_values: Vec<Option<f64>> = (0..bars.len())
        .map(|i| {
            if i + 1 < k_period {
                return None;
            }
            let window = &bars[i + 1 - k_period..=i];
            let highest = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
            let range = highest - lowest;
            if range <= 0.0 {
                None
            } else {
                Some(100.0 * (bars[i].close - lowest) / range)
            }
        })
        .collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let d = if i + 1 >= d_period {
                k_values[i + 1 - d_period..=i]
                    .iter()
                    .copied()
                    .collect::<Option<Vec<f64>>>()
                    .map(|w| w.iter().sum::<f64>() / d_period as f64)
            } else {
                None
            };
            match (k_values[i], d) {
                (Some(k), Some(d)) => IndicatorPoint {
                    date: bar.date,
                    valid: true,
                    value: IndicatorValue::Stochastic { k, d },
                },
                _ => IndicatorPoint {
                    date: bar.date,
                    valid: false,
                    value: IndicatorValue::Stochastic { k: 0.0, d: 0.0 },
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
