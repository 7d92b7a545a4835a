//! CLI definition and dispatch.
//!
//! Results go to stdout; progress is logged through `tracing` on stderr.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_fundamentals_adapter::CsvFundamentalsAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{ScreenerSettings, parse_date, validate_config};
use crate::domain::error::ScreenerError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_engine::{IndicatorResult, compute_indicators};
use crate::domain::screener::{ScreenInputs, ScreenReport, Screener};
use crate::domain::store::SeriesStore;
use crate::domain::strategy::{StrategyKind, build_strategies, parse_strategy_list};
use crate::domain::universe::{parse_symbols, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::fundamentals_port::FundamentalsPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stockscreen", about = "Rule-based stock screener", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the universe with the configured strategies
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated strategy names, overriding [screener] strategies
        #[arg(long)]
        strategies: Option<String>,
        /// Comma-separated symbols, overriding [screener] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Evaluation date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
        /// Write the full report as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List strategies with their default parameters
    Strategies,
    /// Show indicator readings for one symbol
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        as_of: Option<String>,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

/// Command-line overrides for `[screener]` keys.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub strategies: Option<String>,
    pub symbols: Option<String>,
    pub as_of: Option<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Screen {
            config,
            strategies,
            symbols,
            as_of,
            output,
            dry_run,
        } => {
            let overrides = Overrides {
                strategies,
                symbols,
                as_of,
            };
            run_screen(&config, &overrides, output.as_deref(), dry_run)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => run_strategies(),
        Command::Indicators {
            config,
            symbol,
            as_of,
        } => run_indicators(&config, &symbol, as_of.as_deref()),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenerError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// `[screener]` settings with command-line overrides applied.
pub fn resolve_settings(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<ScreenerSettings, ScreenerError> {
    let mut settings = ScreenerSettings::load(config)?;
    if let Some(list) = &overrides.strategies {
        settings.strategies = parse_strategy_list(list)?;
    }
    if let Some(list) = &overrides.symbols {
        settings.symbols = Some(parse_symbols(list)?);
    }
    if let Some(date) = &overrides.as_of {
        settings.as_of = Some(parse_date(date, "as_of")?);
    }
    if settings.strategies.is_empty() {
        return Err(ScreenerError::missing("screener", "strategies"));
    }
    Ok(settings)
}

/// Configured symbols, or every symbol the data port lists minus the benchmark.
pub fn resolve_symbols(
    settings: &ScreenerSettings,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, ScreenerError> {
    if let Some(symbols) = &settings.symbols {
        return Ok(symbols.clone());
    }
    let mut symbols: Vec<String> = data_port
        .list_symbols()?
        .into_iter()
        .map(|s| s.to_uppercase())
        .filter(|s| Some(s) != settings.benchmark.as_ref())
        .collect();
    symbols.sort();
    symbols.dedup();
    if symbols.is_empty() {
        return Err(ScreenerError::DataSource {
            reason: format!("no symbols found in {}", settings.data_dir.display()),
        });
    }
    Ok(symbols)
}

/// Load the universe, benchmark and fundamentals, then screen.
pub fn run_screen_pipeline(
    data_port: &dyn DataPort,
    fundamentals_port: Option<&dyn FundamentalsPort>,
    settings: &ScreenerSettings,
    config: &dyn ConfigPort,
) -> Result<ScreenReport, ScreenerError> {
    let screener = Screener::new(build_strategies(&settings.strategies, config)?)
        .with_workers(settings.workers);

    let symbols = resolve_symbols(settings, data_port)?;
    let (start, end) = settings.load_window();
    info!(symbols = symbols.len(), %start, %end, "loading universe");

    let mut store = SeriesStore::new();
    let validation = validate_universe(
        data_port,
        &mut store,
        symbols,
        start,
        end,
        screener.min_bars(),
    )?;

    if let Some(benchmark) = &settings.benchmark {
        if !store.contains(benchmark) {
            if let Err(e) = store.load(data_port, benchmark, start, end) {
                warn!(benchmark = %benchmark, error = %e, "benchmark unavailable");
            }
        }
    }

    let needs_fundamentals = settings.strategies.iter().any(|k| k.needs_fundamentals());
    let fundamentals = match fundamentals_port {
        Some(port) if needs_fundamentals => {
            port.fetch_fundamentals(&validation.universe.symbols, settings.as_of)?
        }
        None if needs_fundamentals => {
            warn!("no fundamentals_dir configured; fundamentals criteria will fail");
            Default::default()
        }
        _ => Default::default(),
    };

    let mut report = screener.run(&ScreenInputs {
        store: &store,
        universe: &validation.universe,
        fundamentals: &fundamentals,
        benchmark: settings.benchmark.as_deref(),
        as_of: settings.as_of,
    });

    for strategy in &mut report.strategies {
        let mut skipped = validation.skipped.clone();
        skipped.append(&mut strategy.skipped);
        strategy.skipped = skipped;
    }
    Ok(report)
}

/// Plain-text summary printed by `screen`.
pub fn format_report(report: &ScreenReport) -> String {
    let mut out = String::new();
    for strategy in &report.strategies {
        let _ = writeln!(
            out,
            "== {} ({} evaluated, {} qualified, {} skipped) ==",
            strategy.name,
            strategy.verdicts.len(),
            strategy.qualified().count(),
            strategy.skipped.len()
        );
        for verdict in &strategy.verdicts {
            let _ = write!(
                out,
                "{:<4} {:<8} {:>5.1}  {}",
                if verdict.passed { "PASS" } else { "fail" },
                verdict.symbol,
                verdict.score,
                verdict.evaluated_at
            );
            if let Some(signal) = &verdict.signal {
                let _ = write!(out, "  {signal}");
            }
            out.push('\n');
        }
        for skipped in &strategy.skipped {
            let _ = writeln!(out, "skip {:<8} {}", skipped.symbol, skipped.reason);
        }
    }
    out
}

fn fundamentals_adapter(settings: &ScreenerSettings) -> Option<CsvFundamentalsAdapter> {
    settings
        .fundamentals_dir
        .as_ref()
        .map(|dir| CsvFundamentalsAdapter::new(dir.clone()))
}

fn run_screen(
    config_path: &Path,
    overrides: &Overrides,
    output: Option<&Path>,
    dry_run: bool,
) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let settings = resolve_settings(&config, overrides)?;

    if dry_run {
        let strategies = build_strategies(&settings.strategies, &config)?;
        println!("Configuration is valid.");
        println!("Strategies:");
        for strategy in &strategies {
            println!("  {:<13} {}", strategy.name(), strategy.describe());
        }
        match &settings.symbols {
            Some(symbols) => println!("Symbols: {}", symbols.join(", ")),
            None => println!("Symbols: all in {}", settings.data_dir.display()),
        }
        let (start, end) = settings.load_window();
        println!("Window: {start} to {end}");
        println!("Workers: {}", settings.workers);
        return Ok(());
    }

    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let fundamentals = fundamentals_adapter(&settings);
    let report = run_screen_pipeline(
        &data_port,
        fundamentals.as_ref().map(|f| f as &dyn FundamentalsPort),
        &settings,
        &config,
    )?;

    print!("{}", format_report(&report));

    if let Some(path) = output {
        CsvReportAdapter::new().write(&report, path)?;
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let settings = validate_config(&config)?;
    let names: Vec<&str> = settings.strategies.iter().map(|k| k.name()).collect();
    println!("Configuration is valid.");
    println!("Strategies: {}", names.join(", "));
    Ok(())
}

fn run_strategies() -> Result<(), ScreenerError> {
    let defaults = FileConfigAdapter::from_string("")?;
    for kind in StrategyKind::ALL {
        let strategy = kind.build(&defaults)?;
        println!(
            "{:<15} [{}] min {} bars: {}",
            kind.name(),
            kind.section(),
            strategy.min_bars(),
            strategy.describe()
        );
    }
    Ok(())
}

/// Readings of every indicator the configured strategies use (all strategies
/// when none are configured) at the last bar on or before `as_of`.
pub fn indicator_snapshot(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    settings: &ScreenerSettings,
    symbol: &str,
) -> Result<IndicatorResult, ScreenerError> {
    let kinds: Vec<StrategyKind> = if settings.strategies.is_empty() {
        StrategyKind::ALL.to_vec()
    } else {
        settings.strategies.clone()
    };
    let mut types: Vec<IndicatorType> = build_strategies(&kinds, config)?
        .iter()
        .flat_map(|s| s.indicators())
        .collect();
    types.sort();
    types.dedup();

    let (start, end) = settings.load_window();
    let mut store = SeriesStore::new();
    store.load(data_port, symbol, start, end)?;
    let no_data = || ScreenerError::NoData {
        symbol: symbol.to_string(),
    };
    let series = store.get(symbol).ok_or_else(no_data)?;
    let bars = match settings.as_of {
        Some(date) => series.until(date),
        None => series.bars(),
    };

    let computed = compute_indicators(bars, &types);
    IndicatorResult::latest(symbol, bars, &computed).ok_or_else(no_data)
}

fn run_indicators(config_path: &Path, symbol: &str, as_of: Option<&str>) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let mut settings = ScreenerSettings::load(&config)?;
    if let Some(date) = as_of {
        settings.as_of = Some(parse_date(date, "as_of")?);
    }
    let symbol = symbol.trim().to_uppercase();
    let data_port = CsvAdapter::new(settings.data_dir.clone());
    let snapshot = indicator_snapshot(&data_port, &config, &settings, &symbol)?;

    println!("{} on {}", snapshot.symbol, snapshot.date);
    for (name, reading) in &snapshot.readings {
        println!("  {name:<24} {reading}");
    }
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let settings = ScreenerSettings::load(&config)?;
    let symbols = CsvAdapter::new(settings.data_dir.clone()).list_symbols()?;
    if symbols.is_empty() {
        warn!(dir = %settings.data_dir.display(), "no symbols found");
    }
    for symbol in &symbols {
        println!("{symbol}");
    }
    info!(count = symbols.len(), "symbols listed");
    Ok(())
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> Result<(), ScreenerError> {
    let config = load_config(config_path)?;
    let settings = ScreenerSettings::load(&config)?;
    let data_port = CsvAdapter::new(settings.data_dir.clone());

    let symbols = match symbol {
        Some(s) => vec![s.trim().to_uppercase()],
        None => match &settings.symbols {
            Some(symbols) => symbols.clone(),
            None => data_port.list_symbols()?,
        },
    };

    for s in &symbols {
        match data_port.get_data_range(s)? {
            Some((first, last, count)) => println!("{s}: {count} bars, {first} to {last}"),
            None => println!("{s}: no data found"),
        }
    }
    Ok(())
}
