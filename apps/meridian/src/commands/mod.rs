mod backtest;
mod batch;
mod common;
mod optimize;
mod report;
mod strategies;
mod validate;

use meridian_application::error::AppError;
use std::path::PathBuf;

pub enum Command {
    Backtest { config: PathBuf, out: Option<PathBuf> },
    Batch { config: PathBuf, out: Option<PathBuf> },
    Optimize { config: PathBuf, out: Option<PathBuf> },
    Validate { config: PathBuf },
    Report { input: PathBuf },
    Strategies { json: bool },
}

pub fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Backtest { config, out } => backtest::run_backtest(config, out),
        Command::Batch { config, out } => batch::run_batch(config, out),
        Command::Optimize { config, out } => optimize::run_optimize(config, out),
        Command::Validate { config } => validate::run_validate(config),
        Command::Report { input } => report::run_report(input),
        Command::Strategies { json } => strategies::run_strategies(json),
    }
}
