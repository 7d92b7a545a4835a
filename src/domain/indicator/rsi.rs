//! RSI (Relative Strength Index) indicators.
//!
//! Both variants compute RSI = 100 - (100 / (1 + avg_gain / avg_loss)) over
//! close-to-close changes and differ only in how the averages are smoothed:
//!
//! - `calculate_rsi` (Wilder): first average is the simple mean of the first
//!   n changes, then avg = (prev_avg * (n-1) + current) / n. avg_loss == 0 gives 100.
//! - `calculate_cutler_rsi`: simple rolling mean of the last n changes.
//!   avg_loss == 0 gives 100 unless avg_gain is also 0, which is undefined.
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorSeries, IndicatorType, simple_point};
use crate::domain::ohlcv::OhlcvBar;

fn changes(bars: &[OhlcvBar]) -> (Vec<f64>, Vec<f64>) {
    bars.windows(2)
        .map(|w| {
            let change = w[1].close - w[0].close;
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip()
}

fn rsi_from(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let (gains, losses) = changes(bars);

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if period == 0 || i < period {
            values.push(simple_point(bar.date, false, 0.0));
            continue;
        }
        // gains[j] is the change into bar j + 1
        if i == period {
            avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
            avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gains[i - 1]) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + losses[i - 1]) / period as f64;
        }
        values.push(simple_point(bar.date, true, rsi_from(avg_gain, avg_loss)));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

pub fn calculate_cutler_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let (gains, losses) = changes(bars);

    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if i > 0 {
            gain_sum += gains[i - 1];
            loss_sum += losses[i - 1];
            if period > 0 && i > period {
                gain_sum -= gains[i - 1 - period];
                loss_sum -= losses[i - 1 - period];
            }
        }
        if period == 0 || i < period {
            values.push(simple_point(bar.date, false, 0.0));
            continue;
        }
        let avg_gain = gain_sum / period as f64;
        let avg_loss = loss_sum / period as f64;
        // Rolling subtraction can leave tiny residues on flat stretches.
        let flat = avg_gain.abs() < 1e-12 && avg_loss.abs() < 1e-12;
        let avg_loss = if avg_loss.abs() < 1e-12 { 0.0 } else { avg_loss };
        values.push(simple_point(bar.date, !flat, rsi_from(avg_gain, avg_loss)));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::CutlerRsi(period),
        values,
    }
}
