//! LEAP call entries on weakness inside an uptrend.
//!
//! `leap_dip` fires on a down day while price holds above its SMA and stays
//! out of bear-market territory. `leap_gap` fires on a gap down at the open.
//! Both read the `[leap]` section and attach an [`OptionSignal`] on a pass.

use super::{
    EvalContext, Strategy, check, prepare, read_count, read_fraction, read_period, read_positive,
};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::verdict::{OptionKind, OptionSignal, Signal, Verdict};
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "leap";

/// Contract terms shared by both LEAP entries.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTerms {
    pub delta: f64,
    pub expiry_months: u32,
    pub profit_lock_pct: f64,
}

impl Default for OptionTerms {
    fn default() -> Self {
        Self {
            delta: 0.60,
            expiry_months: 12,
            profit_lock_pct: 50.0,
        }
    }
}

impl OptionTerms {
    fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = OptionTerms::default();
        Ok(Self {
            delta: read_fraction(config, SECTION, "delta", d.delta)?,
            expiry_months: read_count(config, SECTION, "expiry_months", d.expiry_months)?,
            profit_lock_pct: read_positive(config, SECTION, "profit_lock_pct", d.profit_lock_pct)?,
        })
    }

    fn signal(&self, contracts: u32) -> Signal {
        Signal::Option(OptionSignal {
            kind: OptionKind::LeapCall,
            delta: self.delta,
            expiry_months: self.expiry_months,
            contracts,
            profit_lock_pct: self.profit_lock_pct,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeapDipParams {
    /// Minimum close-to-close decline, in percent.
    pub drop_pct: f64,
    pub sma_period: usize,
    /// Drawdown from the high that counts as a bear market.
    pub bear_drawdown: f64,
    pub high_window: usize,
    pub contracts: u32,
    pub terms: OptionTerms,
}

impl Default for LeapDipParams {
    fn default() -> Self {
        Self {
            drop_pct: 1.0,
            sma_period: 100,
            bear_drawdown: 0.20,
            high_window: 252,
            contracts: 1,
            terms: OptionTerms::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeapDip {
    params: LeapDipParams,
}

impl LeapDip {
    pub fn new(params: LeapDipParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = LeapDipParams::default();
        Ok(Self::new(LeapDipParams {
            drop_pct: read_positive(config, SECTION, "drop_pct", d.drop_pct)?,
            sma_period: read_period(config, SECTION, "sma_period", d.sma_period)?,
            bear_drawdown: read_fraction(config, SECTION, "bear_drawdown", d.bear_drawdown)?,
            high_window: read_period(config, SECTION, "high_window", d.high_window)?,
            contracts: read_count(config, SECTION, "dip_contracts", d.contracts)?,
            terms: OptionTerms::from_config(config)?,
        }))
    }
}

impl Strategy for LeapDip {
    fn name(&self) -> &'static str {
        "leap_dip"
    }

    fn min_bars(&self) -> usize {
        self.params.sma_period.max(2)
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        vec![
            IndicatorType::Sma(self.params.sma_period),
            IndicatorType::Highest(self.params.high_window),
        ]
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let today = &ctx.bars[prep.last];
        let prev_close = ctx.bars[prep.last - 1].close;

        let change = today.change_pct(prev_close);
        if let Some(c) = change {
            prep.readings.insert_value("change_pct", c);
        }
        let sma = prep.last(IndicatorType::Sma(p.sma_period));
        let high = prep.last(IndicatorType::Highest(p.high_window));

        let criteria = vec![
            check("down_day", change.map(|c| c <= -p.drop_pct)),
            check("above_sma", sma.map(|s| today.close > s)),
            check(
                "not_bear_market",
                high.map(|h| today.close >= (1.0 - p.bear_drawdown) * h),
            ),
        ];
        let verdict = Verdict::from_criteria(self.name(), prep.readings, criteria);
        Ok(if verdict.passed {
            verdict.with_signal(p.terms.signal(p.contracts))
        } else {
            verdict
        })
    }

    fn describe(&self) -> String {
        let p = &self.params;
        format!(
            "down >= {}% with close > SMA({}) and within {}% of {}-bar high; {}x call delta {}",
            p.drop_pct,
            p.sma_period,
            p.bear_drawdown * 100.0,
            p.high_window,
            p.contracts,
            p.terms.delta
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeapGapParams {
    /// Minimum gap down at the open, in percent.
    pub gap_pct: f64,
    pub contracts: u32,
    pub terms: OptionTerms,
}

impl Default for LeapGapParams {
    fn default() -> Self {
        Self {
            gap_pct: 2.0,
            contracts: 2,
            terms: OptionTerms::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LeapGap {
    params: LeapGapParams,
}

impl LeapGap {
    pub fn new(params: LeapGapParams) -> Self {
        Self { params }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let d = LeapGapParams::default();
        Ok(Self::new(LeapGapParams {
            gap_pct: read_positive(config, SECTION, "gap_pct", d.gap_pct)?,
            contracts: read_count(config, SECTION, "gap_contracts", d.contracts)?,
            terms: OptionTerms::from_config(config)?,
        }))
    }
}

impl Strategy for LeapGap {
    fn name(&self) -> &'static str {
        "leap_gap"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn indicators(&self) -> Vec<IndicatorType> {
        Vec::new()
    }

    fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<Verdict, ScreenerError> {
        let p = &self.params;
        let mut prep = prepare(self, ctx)?;
        let today = &ctx.bars[prep.last];
        let gap = today.gap_pct(ctx.bars[prep.last - 1].close);
        if let Some(g) = gap {
            prep.readings.insert_value("gap_pct", g);
        }

        let criteria = vec![check("gap_down", gap.map(|g| g <= -p.gap_pct))];
        let verdict = Verdict::from_criteria(self.name(), prep.readings, criteria);
        Ok(if verdict.passed {
            verdict.with_signal(p.terms.signal(p.contracts))
        } else {
            verdict
        })
    }

    fn describe(&self) -> String {
        format!(
            "open gaps down >= {}%; {}x call delta {}",
            self.params.gap_pct, self.params.contracts, self.params.terms.delta
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::{MapConfig, bars_from_closes, linear_closes};
    use approx::assert_relative_eq;

    fn dip_bars(drop: f64) -> Vec<crate::domain::ohlcv::OhlcvBar> {
        let mut closes = linear_closes(150, 100.0, 0.5);
        let prev = closes[148];
        closes[149] = prev * (1.0 - drop);
        bars_from_closes(&closes)
    }

    #[test]
    fn dip_in_uptrend_signals_one_contract() {
        let bars = dip_bars(0.02);
        let verdict = LeapDip::new(LeapDipParams::default())
            .evaluate(&EvalContext::new("QQQ", &bars))
            .unwrap();
        assert!(verdict.passed, "{:?}", verdict.criteria);
        assert_relative_eq!(verdict.readings.value("change_pct").unwrap(), -2.0, epsilon = 1e-9);
        match verdict.signal {
            Some(Signal::Option(o)) => {
                assert_eq!(o.contracts, 1);
                assert_eq!(o.expiry_months, 12);
                assert_relative_eq!(o.delta, 0.6);
            }
            other => panic!("expected option signal, got {other:?}"),
        }
    }

    #[test]
    fn small_dip_has_no_signal() {
        let bars = dip_bars(0.005);
        let verdict = LeapDip::new(LeapDipParams::default())
            .evaluate(&EvalContext::new("QQQ", &bars))
            .unwrap();
        assert!(!verdict.passed);
        assert!(verdict.signal.is_none());
    }

    #[test]
    fn bear_market_blocks_dip() {
        // Rally to 200, then a slide to 150: below 80% of the high.
        let mut closes = linear_closes(150, 100.0, 100.0 / 149.0);
        closes.extend(linear_closes(50, 198.0, -1.0));
        let bars = bars_from_closes(&closes);
        let verdict = LeapDip::new(LeapDipParams::default())
            .evaluate(&EvalContext::new("QQQ", &bars))
            .unwrap();
        let failed: Vec<&str> = verdict.failed_criteria().map(|c| c.name.as_str()).collect();
        assert!(failed.contains(&"not_bear_market"));
    }

    #[test]
    fn gap_down_signals_two_contracts() {
        let mut bars = bars_from_closes(&[100.0, 99.0]);
        bars[1].open = 97.0;
        bars[0].close = 100.0;
        let verdict = LeapGap::new(LeapGapParams::default())
            .evaluate(&EvalContext::new("QQQ", &bars))
            .unwrap();
        assert!(verdict.passed);
        assert_relative_eq!(verdict.readings.value("gap_pct").unwrap(), -3.0, epsilon = 1e-9);
        assert!(matches!(verdict.signal, Some(Signal::Option(ref o)) if o.contracts == 2));
    }

    #[test]
    fn small_gap_ignored() {
        let mut bars = bars_from_closes(&[100.0, 99.0]);
        bars[1].open = 99.0;
        let verdict = LeapGap::new(LeapGapParams::default())
            .evaluate(&EvalContext::new("QQQ", &bars))
            .unwrap();
        assert!(!verdict.passed);
        assert!(verdict.signal.is_none());
    }

    #[test]
    fn gap_needs_two_bars() {
        let bars = bars_from_closes(&[100.0]);
        assert!(matches!(
            LeapGap::new(LeapGapParams::default()).evaluate(&EvalContext::new("QQQ", &bars)),
            Err(ScreenerError::InsufficientData { minimum: 2, .. })
        ));
    }

    #[test]
    fn shared_terms_from_config() {
        let config = MapConfig::new()
            .set(SECTION, "delta", "0.7")
            .set(SECTION, "gap_contracts", "3");
        let gap = LeapGap::from_config(&config).unwrap();
        assert_eq!(gap.params.contracts, 3);
        assert_relative_eq!(gap.params.terms.delta, 0.7);
        let dip = LeapDip::from_config(&config).unwrap();
        assert_relative_eq!(dip.params.terms.delta, 0.7);

        let bad = MapConfig::new().set(SECTION, "delta", "1.5");
        assert!(LeapGap::from_config(&bad).is_err());
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let too_big = "4294967297";
        let invalid_key = |result: Result<(), ScreenerError>| match result {
            Err(ScreenerError::ConfigInvalid { key, .. }) => Some(key),
            _ => None,
        };

        let config = MapConfig::new().set(SECTION, "expiry_months", too_big);
        assert_eq!(invalid_key(LeapGap::from_config(&config).map(|_| ())).as_deref(), Some("expiry_months"));

        let config = MapConfig::new().set(SECTION, "dip_contracts", too_big);
        assert_eq!(invalid_key(LeapDip::from_config(&config).map(|_| ())).as_deref(), Some("dip_contracts"));
        assert!(LeapGap::from_config(&config).is_ok());

        let config = MapConfig::new().set(SECTION, "gap_contracts", too_big);
        assert_eq!(invalid_key(LeapGap::from_config(&config).map(|_| ())).as_deref(), Some("gap_contracts"));
    }
}
