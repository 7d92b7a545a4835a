//! Screener orchestrator: runs every strategy over every universe symbol.

use crate::domain::fundamentals::Fundamentals;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::PriceSeries;
use crate::domain::store::SeriesStore;
use crate::domain::strategy::{EvalContext, Strategy};
use crate::domain::universe::{SkipReason, SkippedSymbol, Universe};
use crate::domain::verdict::{Criterion, Verdict};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Verdicts and skips for one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub name: String,
    /// Sorted by score (highest first), then symbol.
    pub verdicts: Vec<Verdict>,
    pub skipped: Vec<SkippedSymbol>,
}

impl StrategyReport {
    pub fn qualified(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.iter().filter(|v| v.passed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenReport {
    pub as_of: Option<NaiveDate>,
    pub strategies: Vec<StrategyReport>,
}

impl ScreenReport {
    pub fn strategy(&self, name: &str) -> Option<&StrategyReport> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// Qualified symbols per strategy, in report order.
    pub fn qualified(&self) -> Vec<(&str, Vec<&str>)> {
        self.strategies
            .iter()
            .map(|s| {
                (
                    s.name.as_str(),
                    s.qualified().map(|v| v.symbol.as_str()).collect(),
                )
            })
            .collect()
    }

    pub fn verdict_count(&self) -> usize {
        self.strategies.iter().map(|s| s.verdicts.len()).sum()
    }
}

/// Everything a run reads besides the strategies themselves.
#[derive(Debug, Clone, Copy)]
pub struct ScreenInputs<'a> {
    pub store: &'a SeriesStore,
    pub universe: &'a Universe,
    pub fundamentals: &'a HashMap<String, Fundamentals>,
    pub benchmark: Option<&'a str>,
    pub as_of: Option<NaiveDate>,
}

pub struct Screener {
    strategies: Vec<Box<dyn Strategy>>,
    workers: usize,
}

type Outcome = Result<Verdict, SkippedSymbol>;

impl Screener {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            strategies,
            workers: 1,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn strategies(&self) -> &[Box<dyn Strategy>] {
        &self.strategies
    }

    /// Smallest bar count any strategy accepts.
    pub fn min_bars(&self) -> usize {
        self.strategies
            .iter()
            .map(|s| s.min_bars())
            .min()
            .unwrap_or(1)
    }

    pub fn run(&self, inputs: &ScreenInputs<'_>) -> ScreenReport {
        info!(
            symbols = inputs.universe.count(),
            strategies = self.strategies.len(),
            workers = self.workers,
            as_of = ?inputs.as_of,
            "screening"
        );

        let benchmark = inputs
            .benchmark
            .and_then(|b| inputs.store.get(b))
            .map(|s| bars_as_of(s, inputs.as_of));
        if inputs.benchmark.is_some() && benchmark.is_none() {
            warn!(benchmark = ?inputs.benchmark, "benchmark series not loaded");
        }

        let outcomes: Vec<Vec<Outcome>> = if self.workers <= 1 {
            inputs
                .universe
                .symbols
                .iter()
                .map(|symbol| self.screen_symbol(symbol, inputs, benchmark))
                .collect()
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    inputs
                        .universe
                        .symbols
                        .par_iter()
                        .map(|symbol| self.screen_symbol(symbol, inputs, benchmark))
                        .collect()
                }),
                Err(e) => {
                    warn!(error = %e, "worker pool unavailable, screening sequentially");
                    inputs
                        .universe
                        .symbols
                        .iter()
                        .map(|symbol| self.screen_symbol(symbol, inputs, benchmark))
                        .collect()
                }
            }
        };

        let mut reports: Vec<StrategyReport> = self
            .strategies
            .iter()
            .map(|s| StrategyReport {
                name: s.name().to_string(),
                verdicts: Vec::new(),
                skipped: Vec::new(),
            })
            .collect();

        for per_symbol in outcomes {
            for (report, outcome) in reports.iter_mut().zip(per_symbol) {
                match outcome {
                    Ok(verdict) => report.verdicts.push(verdict),
                    Err(skip) => report.skipped.push(skip),
                }
            }
        }

        for (report, strategy) in reports.iter_mut().zip(&self.strategies) {
            let key = strategy.rank_by();
            report.verdicts.sort_by(|a, b| rank(a, b, key));
            if let Some(n) = strategy.keep_top() {
                cut_to_top(&mut report.verdicts, n);
                report.verdicts.sort_by(|a, b| rank(a, b, key));
            }
            info!(
                strategy = %report.name,
                evaluated = report.verdicts.len(),
                qualified = report.qualified().count(),
                skipped = report.skipped.len(),
                "strategy complete"
            );
        }

        ScreenReport {
            as_of: inputs.as_of,
            strategies: reports,
        }
    }

    /// One outcome per strategy, in strategy order.
    fn screen_symbol(
        &self,
        symbol: &str,
        inputs: &ScreenInputs<'_>,
        benchmark: Option<&[OhlcvBar]>,
    ) -> Vec<Outcome> {
        let bars = inputs
            .store
            .get(symbol)
            .map(|s| bars_as_of(s, inputs.as_of))
            .unwrap_or_default();

        if bars.is_empty() {
            warn!(symbol, "no bars on or before evaluation date");
            return self
                .strategies
                .iter()
                .map(|_| {
                    Err(SkippedSymbol {
                        symbol: symbol.to_string(),
                        reason: SkipReason::NoData,
                    })
                })
                .collect();
        }

        let mut ctx = EvalContext::new(symbol, bars);
        if let Some(b) = benchmark {
            ctx = ctx.with_benchmark(b);
        }
        if let Some(f) = inputs.fundamentals.get(symbol) {
            ctx = ctx.with_fundamentals(f);
        }

        self.strategies
            .iter()
            .map(|strategy| match strategy.evaluate(&ctx) {
                Ok(verdict) => {
                    debug!(
                        symbol,
                        strategy = strategy.name(),
                        passed = verdict.passed,
                        score = verdict.score,
                        "verdict"
                    );
                    Ok(verdict)
                }
                Err(e) => {
                    warn!(symbol, strategy = strategy.name(), error = %e, "skipping symbol");
                    Err(SkippedSymbol {
                        symbol: symbol.to_string(),
                        reason: SkipReason::from(&e),
                    })
                }
            })
            .collect()
    }
}

/// Bars up to and including the evaluation date.
fn bars_as_of(series: &PriceSeries, as_of: Option<NaiveDate>) -> &[OhlcvBar] {
    match as_of {
        Some(date) => series.until(date),
        None => series.bars(),
    }
}

/// Score, then the strategy's rank reading (missing last), then symbol.
fn rank(a: &Verdict, b: &Verdict, key: Option<&str>) -> Ordering {
    let reading = |v: &Verdict| {
        key.and_then(|k| v.readings.value(k))
            .unwrap_or(f64::NEG_INFINITY)
    };
    b.score
        .total_cmp(&a.score)
        .then_with(|| reading(b).total_cmp(&reading(a)))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Passing verdicts past the first `n` (in ranked order) fail `top_n`.
fn cut_to_top(verdicts: &mut [Verdict], n: usize) {
    let total = verdicts.iter().filter(|v| v.passed).count();
    let mut position = 0;
    for verdict in verdicts.iter_mut() {
        let criterion = if verdict.passed {
            position += 1;
            Criterion::new("top_n", position <= n)
                .with_detail(format!("ranked {position} of {total}"))
        } else {
            Criterion::new("top_n", false).with_detail("unranked")
        };
        verdict.push_criterion(criterion);
    }
}
