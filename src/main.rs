use clap::Parser;
use stockscreen::cli::{Cli, run};
use stockscreen::logging::init_tracing;

fn main() -> std::process::ExitCode {
    init_tracing();
    run(Cli::parse())
}
