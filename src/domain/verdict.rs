//! Per-symbol strategy outcome.

use crate::domain::indicator_engine::IndicatorResult;
use chrono::NaiveDate;
use std::fmt;

/// One named check inside a strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub name: String,
    pub passed: bool,
    pub detail: Option<String>,
}

impl Criterion {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
            TradeAction::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    LeapCall,
}

/// Suggested long-dated option purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSignal {
    pub kind: OptionKind,
    pub delta: f64,
    pub expiry_months: u32,
    pub contracts: u32,
    /// Close the position once it is up this many percent.
    pub profit_lock_pct: f64,
}

impl fmt::Display for OptionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OptionKind::LeapCall => write!(
                f,
                "BUY {}x LEAP CALL delta {:.2} {}m lock {}%",
                self.contracts, self.delta, self.expiry_months, self.profit_lock_pct
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Option(OptionSignal),
    Trade(TradeAction),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Option(o) => write!(f, "{o}"),
            Signal::Trade(a) => write!(f, "{a}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub symbol: String,
    pub strategy: String,
    pub passed: bool,
    /// Share of criteria that held, 0..=100.
    pub score: f64,
    pub evaluated_at: NaiveDate,
    pub criteria: Vec<Criterion>,
    pub readings: IndicatorResult,
    pub signal: Option<Signal>,
}

impl Verdict {
    /// Build a verdict that passes only when every criterion holds.
    pub fn from_criteria(strategy: &str, readings: IndicatorResult, criteria: Vec<Criterion>) -> Self {
        let passed = !criteria.is_empty() && criteria.iter().all(|c| c.passed);
        Self::with_pass_rule(strategy, readings, criteria, passed)
    }

    /// Build a verdict with an explicit pass decision.
    pub fn with_pass_rule(
        strategy: &str,
        readings: IndicatorResult,
        criteria: Vec<Criterion>,
        passed: bool,
    ) -> Self {
        let score = score(&criteria);
        Self {
            symbol: readings.symbol.clone(),
            strategy: strategy.to_string(),
            passed,
            score,
            evaluated_at: readings.date,
            criteria,
            readings,
            signal: None,
        }
    }

    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Add a criterion after evaluation. A failing one fails the verdict;
    /// the score is recomputed either way.
    pub fn push_criterion(&mut self, criterion: Criterion) {
        self.passed &= criterion.passed;
        self.criteria.push(criterion);
        self.score = score(&self.criteria);
    }

    pub fn failed_criteria(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter().filter(|c| !c.passed)
    }
}

pub fn score(criteria: &[Criterion]) -> f64 {
    if criteria.is_empty() {
        return 0.0;
    }
    let passed = criteria.iter().filter(|c| c.passed).count();
    100.0 * passed as f64 / criteria.len() as f64
}
