//! Band-reversion swing signal.
//!
//! Buys near the lower Bollinger band when RSI has not collapsed and the
//! stochastic is oversold. Sells near the upper band when momentum is fading
//! (MACD under its signal, or an overbought stochastic with price under the
//! parabolic SAR). Otherwise holds.
//!
//! Optional filters, all off by default: hold below the trend SMA, hold
//! without a volume surge, require the close above the SAR to buy, and
//! tighten the band proximity on quiet tape.

use super::{
    EvalContext, Prepared, Strategy, check, ensure_scaled, ensure_shorter, prepare, read_flag,
    read_level, read_non_negative, read_period, read_positive,
};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::{IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signals::return_volatility;
use crate::domain::verdict::{Criterion, Signal, TradeAction, Verdict};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "swing";
const STOCH_OVERSOLD: f64 = 20.0;
const STOCH_OVERBOUGHT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SwingParams {
    pub bb_period: usize,
    pub bb_mult: f64,
    pub rsi_period: usize,
    /// Fractional distance from a band that still counts as touching it.
    pub proximity: f64,
    pub rsi_buy: f64,
    pub rsi_sell: f64,
    pub stoch_k: usize,
    pub stoch_d: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub psar_step: f64,
    pub psar_max: f64,
    /// Hold while the close is under SMA(trend_period).
    pub trend_filter: bool,
    pub trend_period: usize,
    /// Hold unless volume is at least `volume_factor` times its
    /// `volume_period` average.
    pub volume_confirm: bool,
    pub volume_period: usize,
    pub volume_factor: f64,
    pub buy_above_psar: bool,
    /// Use `min(proximity, volatility_mult * stddev of the last
    /// volatility_window returns)` as the band proximity.
    pub adaptive_proximity: bool,
    pub volatility_window: usize,
    pub volatility_mult: f64,
}

impl Default for SwingParams {
    fn default() -> Self {
        Self {
            bb_period: 20,
            bb_mult: 2.0,
            rsi_period: 14,
            proximity: 0.02,
            rsi_buy: 30.0,
            rsi_sell: 65.0,
            stoch_k: 14,
            stoch_d: 3,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            psar_step: 0.02,
            psar_max: 0.2,
            trend_filter: false,
            trend_period: 200,
            volume_confirm: false,
            volume_period: 20,
            volume_factor: 1.2,
            buy_above_psar: false,
            adaptive_proximity: false,
            volatility_window: 10,
            volatility_mult: 1.5,
        }
    }
}

impl SwingParams {
    fn bollinger(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.bb_period,
            stddev_mult_x100: (self.bb_mult * 100.0).round() as u32,
        }
    }

    fn rsi(&self) -> IndicatorType {
        IndicatorType::Rsi(self.rsi_period)
    }

    fn stochastic(&self) -> IndicatorType {
        IndicatorType::Stochastic {
            k_period: self.stoch_k,
            d_period: self.stoch_d,
        }
    }

    fn macd(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    fn psar(&self) -> IndicatorType {
        IndicatorType::Psar {
            step_x1000: (self.psar_step * 1000.0).round() as u32,
            max_step_x1000: (self.psar_max * 1000.0).round() as u32,
        }
    }

    fn trend(&self) -> IndicatorType {
        IndicatorType::Sma(self.trend_period)
    }

    fn avg_volume(&self) -> IndicatorType {
        IndicatorType::VolumeSma(self.volume_period)
    }
}

/// Indicator values at the bar being judged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingSnapshot {
    pub close: f64,
    pub upper: f64,
    pub lower: f64,
    pub rsi: f64,
    pub stoch_k: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub psar: f64,
    /// Band proximity in effect for this bar.
    pub proximity: f64,
    pub trend: Option<f64>,
    pub volume: f64,
    pub avg_volume: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Swing {
    params: SwingParams,
}

impl Swing {
    pub fn new(params: SwingParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = SwingParams::default();
        let params = SwingParams {
            bb_period: read_period(config, SECTION, "bb_period", d.bb_period)?,
            bb_mult: read_positive(config, SECTION, "bb_mult", d.bb_mult)?,
            rsi_period: read_period(config, SECTION, "rsi_period", d.rsi_period)?,
            proximity: read_non_negative(config, SECTION, "proximity", d.proximity)?,
            rsi_buy: read_level(config, SECTION, "rsi_buy", d.rsi_buy)?,
            rsi_sell: read_level(config, SECTION, "rsi_sell", d.rsi_sell)?,
            stoch_k: read_period(config, SECTION, "stoch_k", d.stoch_k)?,
            stoch_d: read_period(config, SECTION, "stoch_d", d.stoch_d)?,
            macd_fast: read_period(config, SECTION, "macd_fast", d.macd_fast)?,
            macd_slow: read_period(config, SECTION, "macd_slow", d.macd_slow)?,
            macd_signal: read_period(config, SECTION, "macd_signal", d.macd_signal)?,
            psar_step: read_positive(config, SECTION, "psar_step", d.psar_step)?,
            psar_max: read_positive(config, SECTION, "psar_max", d.psar_max)?,
            trend_filter: read_flag(config, SECTION, "trend_filter", d.trend_filter)?,
            trend_period: read_period(config, SECTION, "trend_period", d.trend_period)?,
            volume_confirm: read_flag(config, SECTION, "volume_confirm", d.volume_confirm)?,
            volume_period: read_period(config, SECTION, "volume_period", d.volume_period)?,
            volume_factor: read_positive(config, SECTION, "volume_factor", d.volume_factor)?,
            buy_above_psar: read_flag(config, SECTION, "buy_above_psar", d.buy_above_psar)?,
            adaptive_proximity: read_flag(
                config,
                SECTION,
                "adaptive_proximity",
                d.adaptive_proximity,
            )?,
            volatility_window: read_period(
                config,
                SECTION,
                "volatility_window",
                d.volatility_window,
            )?,
            volatility_mult: read_positive(config, SECTION, "volatility_mult", d.volatility_mult)?,
        };
        if params.bb_period < 2 {
            return Err(ScreenerError::invalid(
                SECTION,
                "bb_period",
                "bb_period must be at least 2",
            ));
        }
        if params.volatility_window < 2 {
            return Err(ScreenerError::invalid(
                SECTION,
                "volatility_window",
                "volatility_window must be at least 2",
            ));
        }
        if params.proximity >= 1.0 {
            return Err(ScreenerError::invalid(
                SECTION,
                "proximity",
                "proximity must be below 1",
            ));
        }
        ensure_scaled(SECTION, "bb_mult", params.bb_mult, 100.0)?;
        ensure_scaled(SECTION, "psar_step", params.psar_step, 1000.0)?;
        ensure_scaled(SECTION, "psar_max", params.psar_max, 1000.0)?;
        if params.psar_step > params.psar_max {
            return Err(ScreenerError::invalid(
                SECTION,
                "psar_step",
                "psar_step must not exceed psar_max",
            ));
        }
        ensure_shorter(
            SECTION,
            "macd_fast",
            params.macd_fast,
            "macd_slow",
            params.macd_slow,
        )?;
        Ok(Self::new(params))
    }

    fn near_lower(&self, s: &SwingSnapshot) -> bool {
        s.close <= s.lower * (1.0 + s.proximity)
    }

    fn near_upper(&self, s: &SwingSnapshot) -> bool {
        s.close >= s.upper * (1.0 - s.proximity)
    }

    /// Under the trend SMA. An unknown trend never blocks.
    fn below_trend(&self, s: &SwingSnapshot) -> bool {
        self.params.trend_filter && s.trend.is_some_and(|t| s.close < t)
    }

    /// Volume short of the required surge. An unknown average never blocks.
    fn quiet_volume(&self, s: &SwingSnapshot) -> bool {
        self.params.volume_confirm
            && s
                .avg_volume
                .is_some_and(|avg| s.volume < avg * self.params.volume_factor)
    }

    pub fn decide(&self, s: &SwingSnapshot) -> TradeAction {
        let p = &self.params;
        if self.below_trend(s) || self.quiet_volume(s) {
            return TradeAction::Hold;
        }
        let psar_ok = !p.buy_above_psar || s.close > s.psar;
        if self.near_lower(s) && s.rsi > p.rsi_buy && s.stoch_k < STOCH_OVERSOLD && psar_ok {
            return TradeAction::Buy;
        }
        let fading = s.macd_line < s.macd_signal
            || (s.stoch_k > STOCH_OVERBOUGHT && s.close < s.psar);
        if self.near_upper(s) && s.rsi < p.rsi_sell + 5.0 && fading {
            return TradeAction::Sell;
        }
        TradeAction::Hold
    }

    /// Band proximity for the last bar of `bars`.
    pub fn proximity_for(&self, bars: &[OhlcvBar]) -> f64 {
        let p = &self.params;
        if !p.adaptive_proximity {
            return p.proximity;
        }
        return_volatility(bars, p.volatility_window)
            .map_or(p.proximity, |v| p.proximity.min(v * p.volatility_mult))
    }

    fn snapshot(&self, prep: &Prepared, bars: &[OhlcvBar]) -> Option<SwingSnapshot> {
        let p = &self.params;
        let bar = &bars[prep.last];
        let (upper, lower) = match prep.series(p.bollinger())?.get(prep.last)? {
            IndicatorValue::Bollinger { upper, lower, .. } => (*upper, *lower),
            _ => return None,
        };
        let stoch_k = match prep.series(p.stochastic())?.get(prep.last)? {
            IndicatorValue::Stochastic { k, .. } => *k,
            _ => return None,
        };
        let (macd_line, macd_signal) = match prep.series(p.macd())?.get(prep.last)? {
            IndicatorValue::Macd { line, signal, .. } => (*line, *signal),
            _ => return None,
        };
        Some(SwingSnapshot {
            close: bar.close,
            upper,
            lower,
            rsi: prep.last(p.rsi())?,
            stoch_k,
            macd_line,
            macd_signal,
            psar: prep.last(p.psar())?,
            proximity: self.proximity_for(bars),
            trend: p.trend_filter.then(|| prep.last(p.trend())).flatten(),
            volume: bar.volume as f64,
            avg_volume: p.volume_confirm.then(|| prep.last(p.avg_volume())).flatten(),
        })
    }

    /// Buy conditions as criteria; optional filters appear only when on.
    fn criteria(&self, snapshot: Option<&SwingSnapshot>) -> Vec<Criterion> {
        let p = &self.params;
        let mut criteria = vec![
            check("near_lower_band", snapshot.map(|s| self.near_lower(s))),
            check("rsi_above_floor", snapshot.map(|s| s.rsi > p.rsi_buy)),
            check(
                "stochastic_oversold",
                snapshot.map(|s| s.stoch_k < STOCH_OVERSOLD),
            ),
        ];
        if p.buy_above_psar {
            criteria.push(check("above_psar", snapshot.map(|s| s.close > s.psar)));
        }
        if p.trend_filter {
            criteria.push(match snapshot {
                Some(s) if s.trend.is_none() => {
                    Criterion::new("above_trend", true).with_detail("unknown")
                }
                other => check("above_trend", other.map(|s| !self.below_trend(s))),
            });
        }
        if p.volume_confirm {
            criteria.push(match snapshot {
                Some(s) if s.avg_volume.is_none() => {
                    Criterion::new("volume_confirmed", true).with_detail("unknown")
                }
                other => check("volume_confirmed", other.map(|s| !self.quiet_volume(s))),
            });
        }
        criteria
    }
}

impl Strategy for Swing {
    fn name(&self) -> &'static str {
        "swing"
    }

    fn min_bars(&self) -> usize {
        let p = &self.params;
        let macd = p.macd_fast.max(p.macd_slow) + p.macd_signal - 1;
        let stoch = p.stoch_k + p.stoch_d - 1;
        [p.bb_period, p.rsi_period + 1, macd, stoch, 3]
            .into_iter()
            .max()
            .unwrap_or(3)
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        let p = &self.params;
        let mut indicators = vec![
            p.bollinger(),
            p.rsi(),
            p.stochastic(),
            p.macd(),
            p.psar(),
        ];
        if p.trend_filter {
            indicators.push(p.trend());
        }
        if p.volume_confirm {
            indicators.push(p.avg_volume());
        }
        indicators
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let mut prep = prepare(self, ctx)?;
        let snapshot = self.snapshot(&prep, ctx.bars);
        let action = snapshot
            .as_ref()
            .map_or(TradeAction::Hold, |s| self.decide(s));
        prep.readings
            .insert_flag("buy", action == TradeAction::Buy);
        prep.readings
            .insert_flag("sell", action == TradeAction::Sell);
        if let Some(s) = &snapshot {
            prep.readings.insert_value("proximity", s.proximity);
        }

        let criteria = self.criteria(snapshot.as_ref());
        let verdict = Verdict::with_pass_rule(
            self.name(),
            prep.readings,
            criteria,
            action == TradeAction::Buy,
        );
        Ok(verdict.with_signal(Signal::Trade(action)))
    }

    fn describe(&self) -> String {
        let p = &self.params;
        let mut text = format!(
            "BOLLINGER({},{}) touch within {}%, RSI({}) buy > {} sell < {}, \
             STOCHASTIC({},{}), MACD({},{},{}), PSAR({},{})",
            p.bb_period,
            p.bb_mult,
            p.proximity * 100.0,
            p.rsi_period,
            p.rsi_buy,
            p.rsi_sell + 5.0,
            p.stoch_k,
            p.stoch_d,
            p.macd_fast,
            p.macd_slow,
            p.macd_signal,
            p.psar_step,
            p.psar_max
        );
        if p.trend_filter {
            text.push_str(&format!(", hold under SMA({})", p.trend_period));
        }
        if p.volume_confirm {
            text.push_str(&format!(
                ", volume >= {}x VOLUME_SMA({})",
                p.volume_factor, p.volume_period
            ));
        }
        if p.buy_above_psar {
            text.push_str(", buy above PSAR");
        }
        if p.adaptive_proximity {
            text.push_str(&format!(
                ", proximity capped at {}x {}-bar return stddev",
                p.volatility_mult, p.volatility_window
            ));
        }
        text
    }
}
