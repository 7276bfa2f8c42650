mod commands;
mod infra;
mod obs;

use clap::{Parser, Subcommand, ValueEnum};
use commands::Command;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "meridian")]
#[command(about = "Meridian strategy backtesting CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  meridian backtest --config configs/btc_daily.toml --out runs/\n  meridian batch --config configs/btc_daily.toml\n  meridian optimize --config configs/btc_daily.toml\n  meridian validate --config configs/btc_daily.toml\n  meridian report --input runs/<run_id>/\n  meridian strategies --json\n"
)]
struct Cli {
    /// Log filter used when MERIDIAN_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Serve Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Run one backtest and write its artifacts.
    Backtest {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run every entry of the [batch] table.
    Batch {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Grid-search the [optimize] parameters by Sharpe ratio.
    Optimize {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check a config and its market data without simulating.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Recompute metrics and report.md for an existing run directory.
    Report {
        #[arg(long)]
        input: PathBuf,
    },
    /// List strategy families, sub-strategies and default parameters.
    Strategies {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Backtest { config, out } => Command::Backtest { config, out },
            CliCommand::Batch { config, out } => Command::Batch { config, out },
            CliCommand::Optimize { config, out } => Command::Optimize { config, out },
            CliCommand::Validate { config } => Command::Validate { config },
            CliCommand::Report { input } => Command::Report { input },
            CliCommand::Strategies { json } => Command::Strategies { json },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_level, cli.log_format == LogFormat::Json) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if let Err(err) = commands::run(cli.command.into()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, CliCommand, LogFormat};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "meridian",
            "backtest",
            "--config",
            "run.toml",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level, "info");
        match cli.command {
            CliCommand::Backtest { config, out } => {
                assert_eq!(config, PathBuf::from("run.toml"));
                assert!(out.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn report_requires_an_input_dir() {
        assert!(Cli::try_parse_from(["meridian", "report"]).is_err());
    }
}
