//! Rolling window extremes of close and rolling mean of volume.
//!
//! HIGHEST(n) / LOWEST(n) look back over up to n closes, so every bar is
//! valid (a window shorter than n at the start of the series is accepted).
//! VOLUME_SMA(n) needs a full window.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, simple_point};
use crate::domain::ohlcv::OhlcvBar;

fn rolling_extreme(
    bars: &[OhlcvBar],
    period: usize,
    indicator_type: IndicatorType,
    pick: fn(f64, f64) -> f64,
) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let start = (i + 1).saturating_sub(period);
            let extreme = bars[start..=i]
                .iter()
                .map(|b| b.close)
                .reduce(pick)
                .unwrap_or(bar.close);
            simple_point(bar.date, true, extreme)
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_highest(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    rolling_extreme(bars, period, IndicatorType::Highest(period), f64::max)
}

pub fn calculate_lowest(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    rolling_extreme(bars, period, IndicatorType::Lowest(period), f64::min)
}

pub fn calculate_volume_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let values = rolling_mean(&volumes, period)
        .into_iter()
        .zip(bars)
        .map(|(mean, bar)| simple_point(bar.date, mean.is_some(), mean.unwrap_or(0.0)))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::VolumeSma(period),
        values,
    }
}
