//! Parabolic SAR (Wilder).
//!
//! Starts in an uptrend with the extreme points seeded from the first bar.
//! The acceleration factor begins at `step`, grows by `step` on each new
//! extreme and is capped at `max_step`. On a reversal the SAR jumps to the
//! prior extreme point and the factor resets. The SAR is never placed inside
//! the previous two bars' range.
//!
//! The first two points carry the close and are invalid.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, simple_point};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_psar(bars: &[OhlcvBar], step_x1000: u32, max_step_x1000: u32) -> IndicatorSeries {
    let step = step_x1000 as f64 / 1000.0;
    let max_step = max_step_x1000 as f64 / 1000.0;

    let mut sar: Vec<f64> = bars.iter().map(|b| b.close).collect();

    if bars.len() > 2 {
        let mut up_trend = true;
        let mut af = step;
        let mut up_trend_high = bars[0].high;
        let mut down_trend_low = bars[0].low;

        for i in 2..bars.len() {
            let mut reversal = false;
            let high = bars[i].high;
            let low = bars[i].low;

            if up_trend {
                sar[i] = sar[i - 1] + af * (up_trend_high - sar[i - 1]);
                if low < sar[i] {
                    reversal = true;
                    sar[i] = up_trend_high;
                    down_trend_low = low;
                    af = step;
                } else {
                    if high > up_trend_high {
                        up_trend_high = high;
                        af = (af + step).min(max_step);
                    }
                    let low1 = bars[i - 1].low;
                    let low2 = bars[i - 2].low;
                    if low2 < sar[i] {
                        sar[i] = low2;
                    } else if low1 < sar[i] {
                        sar[i] = low1;
                    }
                }
            } else {
                sar[i] = sar[i - 1] - af * (sar[i - 1] - down_trend_low);
                if high > sar[i] {
                    reversal = true;
                    sar[i] = down_trend_low;
                    up_trend_high = high;
                    af = step;
                } else {
                    if low < down_trend_low {
                        down_trend_low = low;
                        af = (af + step).min(max_step);
                    }
                    let high1 = bars[i - 1].high;
                    let high2 = bars[i - 2].high;
                    if high2 > sar[i] {
                        sar[i] = high2;
                    } else if high1 > sar[i] {
                        sar[i] = high1;
                    }
                }
            }

            up_trend = up_trend != reversal;
        }
    }

    let values = bars
        .iter()
        .zip(sar)
        .enumerate()
        .map(|(i, (bar, v))| simple_point(bar.date, i >= 2, v))
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Psar {
            step_x1000,
            max_step_x1000,
        },
        values,
    }
}
