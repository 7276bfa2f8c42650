use super::csv_text;
use super::pool::run_pool;
use crate::backtesting::execute;
use crate::config::{to_toml_pretty, Config, OptimizeConfig, DEFAULT_MAX_COMBINATIONS};
use crate::error::AppError;
use crate::shared::{
    load_bars, resolve_out_dir, resolve_parallelism, summary_json, write_run_artifacts, RunMeta,
};
use meridian_domain::entities::backtest_result::BacktestResult;
use meridian_domain::errors::BacktestError;
use meridian_domain::repositories::artifacts::ArtifactWriter;
use meridian_domain::repositories::market_data::MarketDataRepository;
use meridian_domain::services::engine::backtest::{BacktestConfig, RunHooks};
use meridian_domain::services::strategy::StrategyFamily;
use meridian_domain::value_objects::bar::Bar;
use meridian_domain::value_objects::parameter::{ParameterSet, ParameterValue};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRange {
    pub key: String,
    pub values: Vec<ParameterValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationEntry {
    pub run_id: String,
    pub params: ParameterSet,
    pub status: String,
    pub error: Option<String>,
    pub sharpe: Option<f64>,
    pub total_return: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub trades: Option<usize>,
}

impl OptimizationEntry {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Every evaluated combination, in evaluation order.
    pub entries: Vec<OptimizationEntry>,
    pub best: Option<(ParameterSet, BacktestResult)>,
    /// Size of the full cartesian product before sampling.
    pub grid_size: usize,
}

impl OptimizationResult {
    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_ok()).count()
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeRunOutput {
    pub optimize_dir: PathBuf,
    pub result: OptimizationResult,
}

/// Number of assignments in the cartesian product of `ranges`. An empty range
/// list counts as one empty assignment.
pub fn grid_size(ranges: &[ParameterRange]) -> Result<usize, AppError> {
    ranges.iter().try_fold(1_usize, |size, range| {
        size.checked_mul(range.values.len()).ok_or_else(|| {
            AppError::invalid_config(format!(
                "optimize grid overflows at `{}`; narrow the ranges",
                range.key
            ))
        })
    })
}

/// Assignment at `index` of the cartesian product, first range varying
/// slowest. `index` must be below `grid_size(ranges)`.
pub fn grid_assignment(ranges: &[ParameterRange], index: usize) -> ParameterSet {
    let mut remainder = index;
    let mut picks = vec![0_usize; ranges.len()];
    for (slot, range) in ranges.iter().enumerate().rev() {
        let radix = range.values.len().max(1);
        picks[slot] = remainder % radix;
        remainder /= radix;
    }
    ranges
        .iter()
        .zip(picks)
        .fold(ParameterSet::new(), |params, (range, pick)| {
            match range.values.get(pick) {
                Some(value) => params.with(&range.key, value.clone()),
                None => params,
            }
        })
}

/// Evenly strided, deterministic grid indices, at most `max` of them.
pub fn sample_indices(grid_size: usize, max: usize) -> Vec<usize> {
    if grid_size <= max {
        return (0..grid_size).collect();
    }
    (0..max)
        .map(|i| (i as u128 * grid_size as u128 / max as u128) as usize)
        .collect()
}

pub(crate) fn ranges_of(optimize: &OptimizeConfig) -> Vec<ParameterRange> {
    optimize
        .params
        .iter()
        .map(|param| ParameterRange {
            key: param.key.clone(),
            values: param.values.clone(),
        })
        .collect()
}

struct Combination {
    run_id: String,
    params: ParameterSet,
}

/// Grid search over `ranges` merged onto `base_params`. Each combination is an
/// independent run on the worker pool; failures are recorded per entry. The
/// best combination is the highest Sharpe, ties going to the earlier one.
#[allow(clippy::too_many_arguments)]
pub fn optimize_parameters(
    run_id: &str,
    family: StrategyFamily,
    base_params: &ParameterSet,
    ranges: &[ParameterRange],
    bars: &[Bar],
    base: &BacktestConfig,
    max_combinations: usize,
    parallelism: usize,
    should_cancel: Option<&(dyn Fn() -> bool + Sync)>,
) -> Result<OptimizationResult, AppError> {
    let grid_size = grid_size(ranges)?;
    let indices = sample_indices(grid_size, max_combinations.max(1));
    if indices.len() < grid_size {
        info!(
            grid_size,
            sampled = indices.len(),
            "grid exceeds max_combinations, sampling"
        );
    }

    let combinations: Vec<Combination> = indices
        .into_iter()
        .map(|index| {
            let assignment = grid_assignment(ranges, index);
            Combination {
                run_id: format!(
                    "{run_id}-{}",
                    assignment_hash(family.label(), &assignment)
                ),
                params: base_params.merged(&assignment),
            }
        })
        .collect();

    let outcomes = run_pool(
        &combinations,
        parallelism,
        |combination| {
            let hooks = RunHooks {
                on_progress: None,
                should_cancel,
            };
            execute(
                family,
                &combination.params,
                bars.to_vec(),
                base.clone(),
                hooks,
            )
            .map(|(result, _)| result)
        },
        &mut |outcome: &Result<BacktestResult, BacktestError>| match outcome {
            Ok(result) => debug!(sharpe = result.metrics.sharpe_ratio, "combination complete"),
            Err(err) => debug!(error = %err, "combination failed"),
        },
    );

    let mut entries = Vec::with_capacity(combinations.len());
    let mut best: Option<(ParameterSet, BacktestResult)> = None;
    for (combination, outcome) in combinations.into_iter().zip(outcomes) {
        match outcome {
            Ok(result) => {
                let metrics = &result.metrics;
                entries.push(OptimizationEntry {
                    run_id: combination.run_id,
                    params: combination.params.clone(),
                    status: "ok".to_string(),
                    error: None,
                    sharpe: Some(metrics.sharpe_ratio),
                    total_return: Some(metrics.total_return),
                    max_drawdown: Some(metrics.max_drawdown),
                    trades: Some(metrics.total_trades),
                });
                let improves = best.as_ref().map_or(true, |(_, current)| {
                    metrics.sharpe_ratio > current.metrics.sharpe_ratio
                });
                if improves {
                    best = Some((combination.params, result));
                }
            }
            Err(err) => {
                let status = match err {
                    BacktestError::Cancelled { .. } => "cancelled",
                    _ => "failed",
                };
                entries.push(OptimizationEntry {
                    run_id: combination.run_id,
                    params: combination.params,
                    status: status.to_string(),
                    error: Some(err.to_string()),
                    sharpe: None,
                    total_return: None,
                    max_drawdown: None,
                    trades: None,
                });
            }
        }
    }

    Ok(OptimizationResult {
        entries,
        best,
        grid_size,
    })
}

/// Runs the `[optimize]` grid for the configured strategy and writes
/// `<out_dir>/<run_id>/optimize/`: `leaderboard.csv`, `entries.json`,
/// `best_params.json` and the best run's artifacts under `best/`.
pub fn optimize_from_config(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    artifacts: &dyn ArtifactWriter,
) -> Result<OptimizeRunOutput, AppError> {
    let _span = info_span!(
        "optimize_parameters",
        run_id = %config.run.run_id,
        strategy = %config.strategy.kind,
        symbol = %config.run.symbol
    )
    .entered();

    config.validate()?;
    let optimize = config
        .optimize
        .as_ref()
        .ok_or_else(|| AppError::invalid_config("missing [optimize] table"))?;
    let family = config.family()?;
    let timeframe = config.timeframe()?;
    let ranges = ranges_of(optimize);
    let bars = load_bars(config, market_data)?;
    let base = config.backtest_config()?;

    let stage_start = Instant::now();
    let result = optimize_parameters(
        &config.run.run_id,
        family,
        &config.strategy.params,
        &ranges,
        &bars,
        &base,
        optimize.max_combinations.unwrap_or(DEFAULT_MAX_COMBINATIONS),
        resolve_parallelism(optimize.parallelism),
        None,
    )?;
    metrics::histogram!("meridian.optimize.run_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    let optimize_dir = resolve_out_dir(config, out)
        .join(&config.run.run_id)
        .join("optimize");
    artifacts
        .ensure_dir(&optimize_dir)
        .map_err(AppError::Port)?;

    let leaderboard_path = optimize_dir.join("leaderboard.csv");
    let text = csv_text(
        &leaderboard_path,
        &[
            "rank",
            "run_id",
            "sharpe",
            "total_return",
            "max_drawdown",
            "trades",
            "params",
        ],
        &leaderboard_rows(&result.entries)?,
    )?;
    artifacts
        .write_text(&leaderboard_path, &text)
        .map_err(AppError::Port)?;
    artifacts
        .write_summary_json(
            &optimize_dir.join("entries.json"),
            &serde_json::to_value(&result.entries)?,
        )
        .map_err(AppError::Port)?;
    artifacts
        .write_text(&optimize_dir.join("config_snapshot.toml"), config_toml)
        .map_err(AppError::Port)?;

    let failed = result.failed();
    if failed > 0 {
        warn!(failed, evaluated = result.entries.len(), "some combinations failed");
    }
    let Some((best_params, best_result)) = &result.best else {
        return Err(AppError::NoViableCombination { failed });
    };

    artifacts
        .write_summary_json(
            &optimize_dir.join("best_params.json"),
            &serde_json::to_value(best_params)?,
        )
        .map_err(AppError::Port)?;
    let summary = summary_json(
        best_result,
        &RunMeta {
            run_id: &config.run.run_id,
            timeframe: &timeframe.label,
        },
        None,
    );
    let best_dir = optimize_dir.join("best");
    write_run_artifacts(&best_dir, best_result, &summary, artifacts)?;
    let mut best_config = config.clone();
    best_config.strategy.params = best_params.clone();
    best_config.batch = None;
    best_config.optimize = None;
    artifacts
        .write_text(
            &best_dir.join("config_snapshot.toml"),
            &to_toml_pretty(&best_config)?,
        )
        .map_err(AppError::Port)?;

    info!(
        optimize_dir = %optimize_dir.display(),
        evaluated = result.entries.len(),
        grid_size = result.grid_size,
        best_sharpe = best_result.metrics.sharpe_ratio,
        "optimization complete"
    );
    Ok(OptimizeRunOutput {
        optimize_dir,
        result,
    })
}

/// Successful entries by Sharpe, descending. The sort is stable so ties keep
/// evaluation order.
fn leaderboard_rows(entries: &[OptimizationEntry]) -> Result<Vec<Vec<String>>, AppError> {
    let mut rows: Vec<&OptimizationEntry> = entries.iter().filter(|e| e.is_ok()).collect();
    rows.sort_by(|a, b| {
        let av = a.sharpe.unwrap_or(f64::NEG_INFINITY);
        let bv = b.sharpe.unwrap_or(f64::NEG_INFINITY);
        bv.partial_cmp(&av).unwrap_or(std::cmp::Ordering::Equal)
    });

    rows.iter()
        .enumerate()
        .map(|(idx, entry)| -> Result<Vec<String>, AppError> {
            Ok(vec![
                (idx + 1).to_string(),
                entry.run_id.clone(),
                optional(entry.sharpe),
                optional(entry.total_return),
                optional(entry.max_drawdown),
                entry.trades.map(|t| t.to_string()).unwrap_or_default(),
                serde_json::to_string(&entry.params)?,
            ])
        })
        .collect()
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v}")).unwrap_or_default()
}

fn assignment_hash(scope: &str, assignment: &ParameterSet) -> String {
    let canonical = serde_json::to_string(assignment)
        .unwrap_or_else(|_| "{\"error\":\"assignment\"}".to_string());
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical.as_bytes());
    let bytes = hasher.finalize();
    to_hex_short(&bytes[..], 12)
}

fn to_hex_short(bytes: &[u8], chars: usize) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(chars);
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        if out.len() >= chars {
            break;
        }
        out.push(HEX[(b & 0x0f) as usize] as char);
        if out.len() >= chars {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        assignment_hash, grid_assignment, grid_size, leaderboard_rows, optimize_parameters,
        sample_indices, OptimizationEntry, ParameterRange,
    };
    use crate::error::AppError;
    use meridian_domain::services::engine::backtest::BacktestConfig;
    use meridian_domain::services::strategy::StrategyFamily;
    use meridian_domain::value_objects::bar::Bar;
    use meridian_domain::value_objects::parameter::{ParameterSet, ParameterValue};

    fn range(key: &str, values: &[i64]) -> ParameterRange {
        ParameterRange {
            key: key.to_string(),
            values: values.iter().map(|v| ParameterValue::Int(*v)).collect(),
        }
    }

    fn wave_bars(count: usize) -> Vec<Bar> {
        (0..count)
            .map(|index| {
                let close = 100.0 + 12.0 * (index as f64 / 11.0).sin() + index as f64 * 0.03;
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

    #[test]
    fn grid_assignment_walks_the_product_in_order() {
        let ranges = [range("fast_period", &[5, 10]), range("slow_period", &[20, 30, 40])];
        assert_eq!(grid_size(&ranges).unwrap(), 6);
        let first = grid_assignment(&ranges, 0);
        assert_eq!(first.get("fast_period"), Some(&ParameterValue::Int(5)));
        assert_eq!(first.get("slow_period"), Some(&ParameterValue::Int(20)));
        let fourth = grid_assignment(&ranges, 3);
        assert_eq!(fourth.get("fast_period"), Some(&ParameterValue::Int(10)));
        assert_eq!(fourth.get("slow_period"), Some(&ParameterValue::Int(20)));
        let last = grid_assignment(&ranges, 5);
        assert_eq!(last.get("fast_period"), Some(&ParameterValue::Int(10)));
        assert_eq!(last.get("slow_period"), Some(&ParameterValue::Int(40)));
        assert_eq!(grid_size(&[]).unwrap(), 1);
        assert_eq!(grid_assignment(&[], 0), ParameterSet::new());
    }

    #[test]
    fn sampling_is_strided_and_bounded() {
        assert_eq!(sample_indices(10, 4), vec![0, 2, 5, 7]);
        assert_eq!(sample_indices(10, 20), (0..10).collect::<Vec<_>>());
        assert_eq!(sample_indices(10, 1), vec![0]);
        assert_eq!(sample_indices(usize::MAX, 2), vec![0, usize::MAX / 2]);
    }

    #[test]
    fn overflowing_grid_is_a_config_error() {
        let values: Vec<i64> = (0..1_000).collect();
        let ranges: Vec<ParameterRange> = (0..8)
            .map(|slot| range(&format!("p{slot}"), &values))
            .collect();
        assert!(matches!(grid_size(&ranges), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn huge_grid_only_builds_the_sampled_combinations() {
        let bars = wave_bars(120);
        let base = BacktestConfig::new("BTCUSD", 10_000.0, 0.001);
        let fast: Vec<i64> = (2..22).collect();
        let slow: Vec<i64> = (30..50).collect();
        let filler: Vec<i64> = (0..20).collect();
        let mut ranges = vec![range("fast_period", &fast), range("slow_period", &slow)];
        ranges.extend((0..6).map(|slot| range(&format!("unused_{slot}"), &filler)));

        let result = optimize_parameters(
            "opt",
            StrategyFamily::Daily,
            &ParameterSet::new().with("sub_strategy", "trend"),
            &ranges,
            &bars,
            &base,
            2,
            1,
            None,
        )
        .unwrap();
        assert_eq!(result.grid_size, 20_usize.pow(8));
        assert_eq!(result.entries.len(), 2);
        assert_eq!(
            result.entries[0].params.get("fast_period"),
            Some(&ParameterValue::Int(2))
        );
        assert_eq!(
            result.entries[1].params.get("fast_period"),
            Some(&ParameterValue::Int(12))
        );
    }

    #[test]
    fn assignment_hash_is_stable_and_short() {
        let a = ParameterSet::new().with("fast_period", 5_i64);
        let b = ParameterSet::new().with("fast_period", 6_i64);
        assert_eq!(assignment_hash("daily", &a), assignment_hash("daily", &a));
        assert_ne!(assignment_hash("daily", &a), assignment_hash("daily", &b));
        assert_eq!(assignment_hash("daily", &a).len(), 12);
    }

    #[test]
    fn best_combination_has_the_highest_sharpe_and_failures_are_kept() {
        let bars = wave_bars(220);
        let base = BacktestConfig::new("BTCUSD", 10_000.0, 0.001);
        let params = ParameterSet::new().with("sub_strategy", "trend");
        // fast 30 / slow 20 is invalid and must fail on its own
        let ranges = [range("fast_period", &[5, 10, 30]), range("slow_period", &[20, 40])];

        let result = optimize_parameters(
            "opt", StrategyFamily::Daily, &params, &ranges, &bars, &base, 50, 3, None,
        )
        .unwrap();
        assert_eq!(result.grid_size, 6);
        assert_eq!(result.entries.len(), 6);
        assert_eq!(result.failed(), 1);
        let failed = result.entries.iter().find(|e| !e.is_ok()).unwrap();
        assert_eq!(failed.params.get("fast_period"), Some(&ParameterValue::Int(30)));
        assert_eq!(failed.params.get("slow_period"), Some(&ParameterValue::Int(20)));

        let (best_params, best_result) = result.best.as_ref().unwrap();
        let max_sharpe = result
            .entries
            .iter()
            .filter_map(|e| e.sharpe)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(best_result.metrics.sharpe_ratio, max_sharpe);
        let first_best = result
            .entries
            .iter()
            .find(|e| e.sharpe == Some(max_sharpe))
            .unwrap();
        assert_eq!(&first_best.params, best_params);
        assert_eq!(best_params.get("sub_strategy"), Some(&ParameterValue::from("trend")));
    }

    #[test]
    fn max_combinations_caps_evaluations() {
        let bars = wave_bars(120);
        let base = BacktestConfig::new("BTCUSD", 10_000.0, 0.001);
        let ranges = [range("fast_period", &[3, 4, 5, 6]), range("slow_period", &[20, 25, 30])];
        let result = optimize_parameters(
            "opt",
            StrategyFamily::Daily,
            &ParameterSet::new(),
            &ranges,
            &bars,
            &base,
            5,
            2,
            None,
        )
        .unwrap();
        assert_eq!(result.grid_size, 12);
        assert_eq!(result.entries.len(), 5);
    }

    #[test]
    fn leaderboard_sorts_by_sharpe_and_skips_failures() {
        let entry = |id: &str, sharpe: Option<f64>| OptimizationEntry {
            run_id: id.to_string(),
            params: ParameterSet::new(),
            status: if sharpe.is_some() { "ok" } else { "failed" }.to_string(),
            error: None,
            sharpe,
            total_return: sharpe,
            max_drawdown: Some(0.1),
            trades: Some(2),
        };
        let rows = leaderboard_rows(&[
            entry("a", Some(0.5)),
            entry("b", None),
            entry("c", Some(1.5)),
            entry("d", Some(0.5)),
        ])
        .unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "d"]);
        assert_eq!(rows[0][0], "1");
    }
}
