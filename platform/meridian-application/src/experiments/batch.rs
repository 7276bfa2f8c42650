use super::csv_text;
use super::pool::run_pool;
use crate::backtesting::execute;
use crate::config::{BatchConfig, Config};
use crate::error::AppError;
use crate::shared::{
    load_bars, resolve_out_dir, resolve_parallelism, summary_json, write_run_artifacts, RunMeta,
};
use meridian_domain::entities::backtest_result::BacktestResult;
use meridian_domain::repositories::artifacts::ArtifactWriter;
use meridian_domain::repositories::market_data::MarketDataRepository;
use meridian_domain::services::engine::backtest::{BacktestConfig, RunHooks};
use meridian_domain::services::strategy::StrategyFamily;
use meridian_domain::value_objects::bar::Bar;
use meridian_domain::value_objects::parameter::ParameterSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchJob {
    pub label: String,
    pub family: StrategyFamily,
    pub params: ParameterSet,
}

/// One job's result. `strategy` falls back to the family label when the
/// strategy could not be built.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub label: String,
    pub strategy: String,
    pub result: Result<BacktestResult, String>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunOutput {
    pub batch_dir: PathBuf,
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchRunOutput {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }
}

/// Runs every job against its own copy of `bars`. A failing job is reported in
/// its outcome and never stops the others. Outcomes come back in job order.
pub fn run_batch(
    jobs: &[BatchJob],
    bars: &[Bar],
    base: &BacktestConfig,
    parallelism: usize,
    should_cancel: Option<&(dyn Fn() -> bool + Sync)>,
    on_outcome: &mut dyn FnMut(&BatchOutcome),
) -> Vec<BatchOutcome> {
    run_pool(
        jobs,
        parallelism,
        |job| {
            let hooks = RunHooks {
                on_progress: None,
                should_cancel,
            };
            match execute(job.family, &job.params, bars.to_vec(), base.clone(), hooks) {
                Ok((result, _)) => BatchOutcome {
                    label: job.label.clone(),
                    strategy: result.strategy_name.clone(),
                    result: Ok(result),
                },
                Err(err) => BatchOutcome {
                    label: job.label.clone(),
                    strategy: job.family.label().to_string(),
                    result: Err(err.to_string()),
                },
            }
        },
        on_outcome,
    )
}

pub fn jobs_from_config(batch: &BatchConfig) -> Result<Vec<BatchJob>, AppError> {
    batch
        .runs
        .iter()
        .map(|run| -> Result<BatchJob, AppError> {
            Ok(BatchJob {
                label: run.label.clone(),
                family: StrategyFamily::parse(&run.kind)?,
                params: run.params.clone(),
            })
        })
        .collect()
}

/// Loads bars once, fans the `[batch]` runs out over the worker pool and
/// writes `<out_dir>/<run_id>/batch/`: `batch.csv` plus one directory of run
/// artifacts per successful label.
pub fn run_batch_from_config(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    artifacts: &dyn ArtifactWriter,
) -> Result<BatchRunOutput, AppError> {
    let _span = info_span!(
        "run_batch",
        run_id = %config.run.run_id,
        strategy = %config.strategy.kind,
        symbol = %config.run.symbol
    )
    .entered();

    config.validate()?;
    let batch = config
        .batch
        .as_ref()
        .ok_or_else(|| AppError::invalid_config("missing [batch] table"))?;
    let jobs = jobs_from_config(batch)?;
    let parallelism = resolve_parallelism(batch.parallelism);
    let bars = load_bars(config, market_data)?;
    let base = config.backtest_config()?;

    info!(jobs = jobs.len(), parallelism, bars = bars.len(), "batch start");
    let stage_start = Instant::now();
    let outcomes = run_batch(&jobs, &bars, &base, parallelism, None, &mut |outcome| {
        match &outcome.result {
            Ok(result) => debug!(
                label = %outcome.label,
                sharpe = result.metrics.sharpe_ratio,
                "batch job complete"
            ),
            Err(err) => warn!(label = %outcome.label, error = %err, "batch job failed"),
        }
    });
    metrics::histogram!("meridian.batch.run_ms").record(stage_start.elapsed().as_millis() as f64);

    let output = BatchRunOutput {
        batch_dir: resolve_out_dir(config, out)
            .join(&config.run.run_id)
            .join("batch"),
        outcomes,
    };
    metrics::counter!("meridian.batch.failed_runs").increment(output.failed() as u64);

    artifacts
        .ensure_dir(&output.batch_dir)
        .map_err(AppError::Port)?;
    for (job, outcome) in jobs.iter().zip(&output.outcomes) {
        if let Ok(result) = &outcome.result {
            metrics::counter!("meridian.backtest.trades").increment(result.trades.len() as u64);
            let timeframe = job.family.timeframe();
            let summary = summary_json(
                result,
                &RunMeta {
                    run_id: &outcome.label,
                    timeframe: &timeframe.label,
                },
                None,
            );
            write_run_artifacts(
                &output.batch_dir.join(&outcome.label),
                result,
                &summary,
                artifacts,
            )?;
        }
    }

    let csv_path = output.batch_dir.join("batch.csv");
    let rows: Vec<Vec<String>> = output.outcomes.iter().map(batch_row).collect();
    let text = csv_text(
        &csv_path,
        &[
            "label",
            "strategy",
            "status",
            "final_capital",
            "total_return",
            "sharpe",
            "max_drawdown",
            "trades",
            "rating",
            "error",
        ],
        &rows,
    )?;
    artifacts
        .write_text(&csv_path, &text)
        .map_err(AppError::Port)?;
    artifacts
        .write_text(&output.batch_dir.join("config_snapshot.toml"), config_toml)
        .map_err(AppError::Port)?;

    info!(
        batch_dir = %output.batch_dir.display(),
        failed = output.failed(),
        "batch complete"
    );
    Ok(output)
}

fn batch_row(outcome: &BatchOutcome) -> Vec<String> {
    match &outcome.result {
        Ok(result) => vec![
            outcome.label.clone(),
            outcome.strategy.clone(),
            "ok".to_string(),
            format!("{}", result.final_capital),
            format!("{}", result.metrics.total_return),
            format!("{}", result.metrics.sharpe_ratio),
            format!("{}", result.metrics.max_drawdown),
            result.metrics.total_trades.to_string(),
            result.rating.label().to_string(),
            String::new(),
        ],
        Err(err) => {
            let mut row = vec![
                outcome.label.clone(),
                outcome.strategy.clone(),
                "failed".to_string(),
            ];
            row.extend(std::iter::repeat(String::new()).take(6));
            row.push(err.clone());
            row
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run_batch, BatchJob};
    use meridian_domain::services::engine::backtest::BacktestConfig;
    use meridian_domain::services::strategy::StrategyFamily;
    use meridian_domain::value_objects::bar::Bar;
    use meridian_domain::value_objects::parameter::ParameterSet;

    fn wave_bars(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|index| {
                let close = 100.0 + 10.0 * (index as f64 / 9.0).sin() + index as f64 * 0.05;
                Bar {
                    symbol: "BTCUSD".to_string(),
                    timestamp: 86_400 * (index as i64 + 1),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    fn jobs() -> Vec<BatchJob> {
        vec![
            BatchJob {
                label: "trend".to_string(),
                family: StrategyFamily::Daily,
                params: ParameterSet::new().with("sub_strategy", "trend"),
            },
            BatchJob {
                label: "broken".to_string(),
                family: StrategyFamily::Daily,
                params: ParameterSet::new()
                    .with("fast_period", 30_i64)
                    .with("slow_period", 10_i64),
            },
            BatchJob {
                label: "swing".to_string(),
                family: StrategyFamily::MidFrequency,
                params: ParameterSet::new().with("sub_strategy", "swing"),
            },
        ]
    }

    #[test]
    fn failures_are_isolated_and_order_is_kept() {
        let bars = wave_bars(200);
        let base = BacktestConfig::new("BTCUSD", 10_000.0, 0.001);
        let mut seen = Vec::new();
        let outcomes = run_batch(&jobs(), &bars, &base, 3, None, &mut |o| {
            seen.push(o.label.clone())
        });

        let labels: Vec<&str> = outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["trend", "broken", "swing"]);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[2].is_ok());
        let err = outcomes[1].result.as_ref().unwrap_err();
        assert!(err.contains("invalid strategy parameters"), "{err}");
        assert_eq!(outcomes[1].strategy, "daily");
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn parallel_and_serial_batches_agree() {
        let bars = wave_bars(200);
        let base = BacktestConfig::new("BTCUSD", 10_000.0, 0.001);
        let serial = run_batch(&jobs(), &bars, &base, 1, None, &mut |_| {});
        let parallel = run_batch(&jobs(), &bars, &base, 4, None, &mut |_| {});
        for (a, b) in serial.iter().zip(&parallel) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.result, b.result);
        }
    }

    #[test]
    fn cancellation_is_reported_per_job() {
        let bars = wave_bars(50);
        let base = BacktestConfig::new("BTCUSD", 10_000.0, 0.001);
        let cancel = || true;
        let outcomes = run_batch(&jobs(), &bars, &base, 2, Some(&cancel), &mut |_| {});
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0]
            .result
            .as_ref()
            .unwrap_err()
            .contains("cancelled"));
    }
}
