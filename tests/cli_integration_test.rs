//! CLI tests against real INI and CSV files on disk.

mod common;

use clap::Parser;
use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use stockscreen::adapters::file_config_adapter::FileConfigAdapter;
use stockscreen::cli::{self, Cli, Overrides};
use stockscreen::domain::error::ScreenerError;
use stockscreen::domain::strategy::StrategyKind;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn same_code(a: ExitCode, b: u8) -> bool {
    format!("{a:?}") == format!("{:?}", ExitCode::from(b))
}

fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_price_csv(dir.path(), &leader_bars("UP"));
    write_price_csv(dir.path(), &trend_bars("DOWN", 260, 300.0, -0.5));
    write_price_csv(dir.path(), &trend_bars("SPY", 260, 100.0, 0.1));
    dir
}

fn screen_ini(data: &Path) -> String {
    format!(
        "[screener]\n\
         data_dir = {}\n\
         symbols = UP,DOWN\n\
         strategies = stage2,bora\n\
         benchmark = SPY\n\
         workers = 2\n",
        data.display()
    )
}

fn run(args: &[&str]) -> ExitCode {
    cli::run(Cli::parse_from(std::iter::once("stockscreen").chain(args.iter().copied())))
}

mod settings_overrides {
    use super::*;

    #[test]
    fn command_line_replaces_config_values() {
        let config = FileConfigAdapter::from_string(
            "[screener]\ndata_dir = /d\nstrategies = stage2\nsymbols = AAPL\n",
        )
        .unwrap();
        let overrides = Overrides {
            strategies: Some("swing, leap-dip".to_string()),
            symbols: Some("msft,nvda".to_string()),
            as_of: Some("2024-06-28".to_string()),
        };
        let settings = cli::resolve_settings(&config, &overrides).unwrap();
        assert_eq!(settings.strategies, vec![StrategyKind::Swing, StrategyKind::LeapDip]);
        assert_eq!(settings.symbols, Some(vec!["MSFT".to_string(), "NVDA".to_string()]));
        assert_eq!(settings.as_of.unwrap().to_string(), "2024-06-28");
    }

    #[test]
    fn strategies_required_somewhere() {
        let config = FileConfigAdapter::from_string("[screener]\ndata_dir = /d\n").unwrap();
        let err = cli::resolve_settings(&config, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigMissing { ref key, .. } if key == "strategies"));

        let overrides = Overrides {
            strategies: Some("golden_cross".to_string()),
            ..Overrides::default()
        };
        assert!(cli::resolve_settings(&config, &overrides).is_ok());
    }

    #[test]
    fn bad_override_values() {
        let config =
            FileConfigAdapter::from_string("[screener]\ndata_dir = /d\nstrategies = stage2\n")
                .unwrap();
        let err = cli::resolve_settings(
            &config,
            &Overrides {
                as_of: Some("yesterday".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap_err();
        assert!(same_code((&err).into(), 2));

        let err = cli::resolve_settings(
            &config,
            &Overrides {
                strategies: Some("stage2,moonshot".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ScreenerError::UnknownStrategy(_)));
        assert!(same_code((&err).into(), 4));
    }
}

mod commands {
    use super::*;

    #[test]
    fn screen_writes_csv_report() {
        let data = data_dir();
        let ini = write_temp_ini(&screen_ini(data.path()));
        let out = data.path().join("reports/screen.csv");

        let code = run(&[
            "screen",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);
        assert!(same_code(code, 0));

        let contents = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "strategy,symbol,status,score,evaluated_at,signal,detail");
        assert!(lines.iter().any(|l| l.starts_with("stage2,UP,pass,100.0,")));
        assert!(lines.iter().any(|l| l.starts_with("stage2,DOWN,fail,")));
        assert!(lines.iter().any(|l| l.starts_with("bora,UP,")));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn listed_lower_case_files_are_screened() {
        let data = TempDir::new().unwrap();
        write_price_csv(data.path(), &leader_bars("lead"));
        write_price_csv(data.path(), &trend_bars("SPY", 260, 100.0, 0.1));
        let ini = write_temp_ini(&format!(
            "[screener]\ndata_dir = {}\nstrategies = stage2\nbenchmark = spy\n",
            data.path().display()
        ));
        let out = data.path().join("out.csv");

        let code = run(&[
            "screen",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);
        assert!(same_code(code, 0));
        let contents = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2, "{contents}");
        assert!(lines[1].starts_with("stage2,LEAD,pass,100.0,"), "{contents}");
    }

    #[test]
    fn dry_run_does_not_write() {
        let data = data_dir();
        let ini = write_temp_ini(&screen_ini(data.path()));
        let out = data.path().join("never.csv");
        let code = run(&[
            "screen",
            "--config",
            ini.path().to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--dry-run",
        ]);
        assert!(same_code(code, 0));
        assert!(!out.exists());
    }

    #[test]
    fn screen_with_unknown_symbols_exits_5() {
        let data = data_dir();
        let ini = write_temp_ini(&screen_ini(data.path()));
        let code = run(&[
            "screen",
            "--config",
            ini.path().to_str().unwrap(),
            "--symbols",
            "ZZZ",
        ]);
        assert!(same_code(code, 5));
    }

    #[test]
    fn missing_config_exits_2() {
        let code = run(&["validate", "--config", "/nonexistent/screen.ini"]);
        assert!(same_code(code, 2));
    }

    #[test]
    fn validate_reports_bad_section() {
        let data = data_dir();
        let ini = write_temp_ini(&format!(
            "{}\n[stage2]\nfast_period = 300\n",
            screen_ini(data.path())
        ));
        let code = run(&["validate", "--config", ini.path().to_str().unwrap()]);
        assert!(same_code(code, 2));
    }

    #[test]
    fn read_only_commands_succeed() {
        let data = data_dir();
        let ini = write_temp_ini(&screen_ini(data.path()));
        let config = ini.path().to_str().unwrap();

        assert!(same_code(run(&["validate", "--config", config]), 0));
        assert!(same_code(run(&["strategies"]), 0));
        assert!(same_code(run(&["list-symbols", "--config", config]), 0));
        assert!(same_code(run(&["info", "--config", config]), 0));
        assert!(same_code(run(&["info", "--config", config, "--symbol", "spy"]), 0));
        assert!(same_code(
            run(&["indicators", "--config", config, "--symbol", "up"]),
            0
        ));
    }

    #[test]
    fn indicators_for_missing_symbol_exits_5() {
        let data = data_dir();
        let ini = write_temp_ini(&screen_ini(data.path()));
        let code = run(&[
            "indicators",
            "--config",
            ini.path().to_str().unwrap(),
            "--symbol",
            "NONE",
        ]);
        assert!(same_code(code, 5));
    }
}
