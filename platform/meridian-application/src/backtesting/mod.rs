use crate::config::Config;
use crate::error::AppError;
use crate::shared::{load_bars, resolve_out_dir, summary_json, write_run_artifacts, RunMeta};
use meridian_domain::entities::backtest_result::BacktestResult;
use meridian_domain::errors::BacktestError;
use meridian_domain::repositories::artifacts::ArtifactWriter;
use meridian_domain::repositories::market_data::MarketDataRepository;
use meridian_domain::services::engine::backtest::{BacktestConfig, BacktestRunner, RunHooks};
use meridian_domain::services::ohlcv::DataQualityReport;
use meridian_domain::services::strategy::StrategyFamily;
use meridian_domain::value_objects::bar::Bar;
use meridian_domain::value_objects::parameter::ParameterSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span, warn};

#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub run_dir: PathBuf,
    pub result: BacktestResult,
    pub data_quality: DataQualityReport,
}

pub fn run_backtest(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    artifacts: &dyn ArtifactWriter,
) -> Result<BacktestOutcome, AppError> {
    run_backtest_with_hooks(
        config,
        config_toml,
        out,
        market_data,
        artifacts,
        RunHooks::default(),
    )
}

pub fn run_backtest_with_hooks(
    config: &Config,
    config_toml: &str,
    out: Option<PathBuf>,
    market_data: &dyn MarketDataRepository,
    artifacts: &dyn ArtifactWriter,
    hooks: RunHooks<'_>,
) -> Result<BacktestOutcome, AppError> {
    let _span = info_span!(
        "run_backtest",
        run_id = %config.run.run_id,
        strategy = %config.strategy.kind,
        symbol = %config.run.symbol
    )
    .entered();

    config.validate()?;
    let family = config.family()?;
    let timeframe = config.timeframe()?;
    let bars = load_bars(config, market_data)?;

    let (result, data_quality) = execute(
        family,
        &config.strategy.params,
        bars,
        config.backtest_config()?,
        hooks,
    )?;
    metrics::counter!("meridian.backtest.trades").increment(result.trades.len() as u64);

    let run_dir = resolve_out_dir(config, out).join(&config.run.run_id);
    let summary = summary_json(
        &result,
        &RunMeta {
            run_id: &config.run.run_id,
            timeframe: &timeframe.label,
        },
        Some(&data_quality),
    );
    write_run_artifacts(&run_dir, &result, &summary, artifacts)?;
    artifacts
        .write_text(&run_dir.join("config_snapshot.toml"), config_toml)
        .map_err(AppError::Port)?;

    info!(run_dir = %run_dir.display(), "artifacts written");
    Ok(BacktestOutcome {
        run_dir,
        result,
        data_quality,
    })
}

/// One independent simulation. Shared by single, batch and optimization runs.
pub fn execute(
    family: StrategyFamily,
    params: &ParameterSet,
    bars: Vec<Bar>,
    config: BacktestConfig,
    hooks: RunHooks<'_>,
) -> Result<(BacktestResult, DataQualityReport), BacktestError> {
    let stage_start = Instant::now();
    let mut runner = BacktestRunner::from_parameters(family, params, bars, config)?;
    let data_quality = runner.data_quality().clone();
    if data_quality.duplicates > 0 || data_quality.invalid_close > 0 {
        warn!(
            duplicates = data_quality.duplicates,
            invalid_close = data_quality.invalid_close,
            out_of_order = data_quality.out_of_order,
            "dropped bars while preparing input"
        );
    }
    let result = runner.run_with_hooks(hooks)?;
    metrics::histogram!("meridian.backtest.run_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    Ok((result, data_quality))
}
