use meridian_application::backtesting::{run_backtest, run_backtest_with_hooks};
use meridian_application::config::Config;
use meridian_application::error::AppError;
use meridian_application::experiments::batch::run_batch_from_config;
use meridian_application::experiments::optimize::optimize_from_config;
use meridian_application::reporting::generate_report;
use meridian_domain::services::engine::backtest::RunHooks;
use meridian_infrastructure::artifacts::{FilesystemArtifactReader, FilesystemArtifactWriter};
use meridian_infrastructure::market_data::CsvMarketDataRepository;
use std::path::{Path, PathBuf};

const DAY: i64 = 86_400;

fn test_temp_dir(prefix: &str) -> PathBuf {
    let unique = format!(
        "meridian_{}_{}_{}",
        prefix,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock before UNIX_EPOCH")
            .as_nanos()
    );
    let dir = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&dir).expect("temp dir");
    dir
}

/// Daily bars on a slow sine wave with drift, enough for 5/20 crossovers.
fn write_wave_csv(dir: &Path, count: usize) -> PathBuf {
    let mut body = String::from("timestamp_utc,open,high,low,close,volume\n");
    for index in 0..count {
        let close = 100.0 + 15.0 * (index as f64 / 13.0).sin() + index as f64 * 0.05;
        body.push_str(&format!(
            "{},{},{},{},{},{}\n",
            DAY * (index as i64 + 1),
            close,
            close + 1.0,
            close - 1.0,
            close,
            1_000.0 + index as f64
        ));
    }
    let path = dir.join("bars.csv");
    std::fs::write(&path, body).expect("write bars");
    path
}

fn config_toml(csv: &Path, out_dir: &Path, extra: &str) -> String {
    format!(
        r#"
[run]
run_id = "wave_trend"
symbol = "BTCUSD"
initial_capital = 10000.0
commission_rate = 0.001

[data]
ohlcv_csv = '{}'

[paths]
out_dir = '{}'

[strategy]
kind = "daily"
[strategy.params]
sub_strategy = "trend"
fast_period = 5
slow_period = 20
{extra}
"#,
        csv.display(),
        out_dir.display()
    )
}

fn parse(toml_str: &str) -> Config {
    toml::from_str(toml_str).expect("config")
}

#[test]
fn backtest_writes_every_artifact() {
    let dir = test_temp_dir("backtest");
    let csv = write_wave_csv(&dir, 260);
    let raw = config_toml(&csv, &dir.join("runs"), "");
    let config = parse(&raw);

    let outcome = run_backtest(
        &config,
        &raw,
        None,
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
    )
    .expect("backtest");

    assert_eq!(outcome.run_dir, dir.join("runs").join("wave_trend"));
    assert_eq!(outcome.result.daily_returns.len(), 260);
    assert_eq!(outcome.data_quality.kept_bars, 260);
    assert!(!outcome.result.trades.is_empty());
    for name in [
        "trades.csv",
        "daily_returns.csv",
        "summary.json",
        "report.md",
        "config_snapshot.toml",
    ] {
        assert!(outcome.run_dir.join(name).exists(), "missing {name}");
    }

    let snapshot = std::fs::read_to_string(outcome.run_dir.join("config_snapshot.toml")).unwrap();
    assert_eq!(snapshot, raw);
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(outcome.run_dir.join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["meta"]["run_id"], "wave_trend");
    assert_eq!(summary["meta"]["timeframe"], "1day");
    assert_eq!(summary["bars_processed"], 260);
    assert_eq!(
        summary["metrics"]["total_trades"],
        outcome.result.metrics.total_trades
    );
    let report = std::fs::read_to_string(outcome.run_dir.join("report.md")).unwrap();
    assert_eq!(report, outcome.result.report);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn date_range_limits_the_replayed_bars() {
    let dir = test_temp_dir("window");
    let csv = write_wave_csv(&dir, 100);
    let mut config = parse(&config_toml(&csv, &dir.join("runs"), ""));
    config.run.start = Some(meridian_application::config::TimestampInput::Epoch(11 * DAY));
    config.run.end = Some(meridian_application::config::TimestampInput::Epoch(60 * DAY));

    let outcome = run_backtest(
        &config,
        "",
        Some(dir.join("elsewhere")),
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
    )
    .expect("backtest");
    assert_eq!(outcome.result.daily_returns.len(), 50);
    assert_eq!(outcome.result.date_range.start, 11 * DAY);
    assert_eq!(outcome.result.date_range.end, 60 * DAY);
    assert_eq!(outcome.data_quality.out_of_range, 50);
    assert!(outcome.run_dir.starts_with(dir.join("elsewhere")));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn progress_is_monotonic_and_ends_at_one() {
    let dir = test_temp_dir("progress");
    let csv = write_wave_csv(&dir, 80);
    let raw = config_toml(&csv, &dir.join("runs"), "");
    let config = parse(&raw);

    let mut seen = Vec::new();
    let mut on_progress = |fraction: f64| seen.push(fraction);
    run_backtest_with_hooks(
        &config,
        &raw,
        None,
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
        RunHooks {
            on_progress: Some(&mut on_progress),
            should_cancel: None,
        },
    )
    .expect("backtest");

    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
    assert_eq!(seen.last().copied(), Some(1.0));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_market_data_is_a_port_error() {
    let dir = test_temp_dir("missing");
    let csv = dir.join("absent.csv");
    let raw = config_toml(&csv, &dir.join("runs"), "");
    let err = run_backtest(
        &parse(&raw),
        &raw,
        None,
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Port(_)), "{err}");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn generate_report_recomputes_from_artifacts() {
    let dir = test_temp_dir("report");
    let csv = write_wave_csv(&dir, 200);
    let raw = config_toml(&csv, &dir.join("runs"), "");
    let outcome = run_backtest(
        &parse(&raw),
        &raw,
        None,
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
    )
    .expect("backtest");
    std::fs::remove_file(outcome.run_dir.join("report.md")).unwrap();

    let regenerated = generate_report(
        &outcome.run_dir,
        &FilesystemArtifactReader::new(),
        &FilesystemArtifactWriter::new(),
    )
    .expect("report");

    assert_eq!(regenerated.run_id, "wave_trend");
    let original = &outcome.result.metrics;
    let again = &regenerated.result.metrics;
    assert_eq!(again.total_trades, original.total_trades);
    assert!((again.total_return - original.total_return).abs() < 1e-9);
    assert!((again.sharpe_ratio - original.sharpe_ratio).abs() < 1e-9);
    assert!((again.max_drawdown - original.max_drawdown).abs() < 1e-9);
    assert_eq!(regenerated.result.rating, outcome.result.rating);
    assert_eq!(regenerated.result.initial_capital, 10_000.0);
    assert!(outcome.run_dir.join("report.md").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn generate_report_requires_run_artifacts() {
    let dir = test_temp_dir("report_missing");
    let err = generate_report(
        &dir,
        &FilesystemArtifactReader::new(),
        &FilesystemArtifactWriter::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("missing trades.csv"));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn batch_isolates_failures_and_writes_a_table() {
    let dir = test_temp_dir("batch");
    let csv = write_wave_csv(&dir, 220);
    let raw = config_toml(
        &csv,
        &dir.join("runs"),
        r#"
[batch]
parallelism = 3
[[batch.runs]]
label = "daily_trend"
kind = "daily"
params = { sub_strategy = "trend", fast_period = 5, slow_period = 20 }
[[batch.runs]]
label = "inverted"
kind = "daily"
params = { fast_period = 40, slow_period = 10 }
[[batch.runs]]
label = "lf_rsi"
kind = "low_frequency"
params = { sub_strategy = "rsi_reversal" }
"#,
    );
    let output = run_batch_from_config(
        &parse(&raw),
        &raw,
        None,
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
    )
    .expect("batch");

    let labels: Vec<&str> = output.outcomes.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["daily_trend", "inverted", "lf_rsi"]);
    assert_eq!(output.failed(), 1);
    assert!(output.batch_dir.join("daily_trend").join("summary.json").exists());
    assert!(!output.batch_dir.join("inverted").exists());

    let table = std::fs::read_to_string(output.batch_dir.join("batch.csv")).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("label,strategy,status"));
    assert!(lines[2].starts_with("inverted,daily,failed"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn optimize_writes_a_sorted_leaderboard_and_the_best_run() {
    let dir = test_temp_dir("optimize");
    let csv = write_wave_csv(&dir, 220);
    let raw = config_toml(
        &csv,
        &dir.join("runs"),
        r#"
[optimize]
max_combinations = 4
parallelism = 2
[[optimize.params]]
key = "fast_period"
values = [3, 5, 8]
[[optimize.params]]
key = "slow_period"
values = [15, 25]
"#,
    );
    let output = optimize_from_config(
        &parse(&raw),
        &raw,
        None,
        &CsvMarketDataRepository::new(&csv),
        &FilesystemArtifactWriter::new(),
    )
    .expect("optimize");

    assert_eq!(output.result.grid_size, 6);
    assert_eq!(output.result.entries.len(), 4);
    assert!(output.optimize_dir.join("best").join("report.md").exists());
    assert!(output.optimize_dir.join("best_params.json").exists());

    let mut reader = csv::Reader::from_path(output.optimize_dir.join("leaderboard.csv")).unwrap();
    let sharpes: Vec<f64> = reader
        .records()
        .map(|r| r.unwrap()[2].parse::<f64>().unwrap())
        .collect();
    assert_eq!(sharpes.len(), 4);
    assert!(sharpes.windows(2).all(|pair| pair[0] >= pair[1]));
    let (_, best) = output.result.best.as_ref().unwrap();
    assert_eq!(best.metrics.sharpe_ratio, sharpes[0]);

    let snapshot =
        std::fs::read_to_string(output.optimize_dir.join("best").join("config_snapshot.toml"))
            .unwrap();
    let rerun = parse(&snapshot);
    assert!(rerun.optimize.is_none());
    let (best_params, _) = output.result.best.as_ref().unwrap();
    assert_eq!(&rerun.strategy.params, best_params);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn validate_reports_data_quality_without_running() {
    let dir = test_temp_dir("validate");
    let csv = write_wave_csv(&dir, 40);
    let raw = config_toml(&csv, &dir.join("runs"), "");
    let report = meridian_application::validation::validate(
        &parse(&raw),
        &CsvMarketDataRepository::new(&csv),
    )
    .expect("validate");
    assert_eq!(report.timeframe, "1day");
    assert_eq!(report.data_quality.kept_bars, 40);
    assert_eq!(report.data_quality.gaps, 0);
    assert_eq!(report.batch_runs, 0);
    assert_eq!(report.warm_up_bars, 34);
    assert!(!dir.join("runs").exists());

    std::fs::remove_dir_all(&dir).ok();
}
