use crate::config::Config;
use crate::error::AppError;
use crate::experiments::optimize::{grid_size, ranges_of};
use crate::shared::load_bars;
use meridian_domain::errors::BacktestError;
use meridian_domain::repositories::market_data::MarketDataRepository;
use meridian_domain::services::ohlcv::{prepare_bars, DataQualityReport};
use meridian_domain::services::strategy::Strategy;
use serde::Serialize;
use tracing::{info, info_span, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub run_id: String,
    pub strategy: String,
    pub symbol: String,
    pub timeframe: String,
    pub data_quality: DataQualityReport,
    /// Bars the strategy needs before its indicators are all available.
    pub warm_up_bars: usize,
    pub batch_runs: usize,
    pub optimize_grid: Option<usize>,
}

/// Checks the config and the market data it points at without simulating.
/// Fails when no bar survives preparation.
pub fn validate(
    config: &Config,
    market_data: &dyn MarketDataRepository,
) -> Result<ValidationReport, AppError> {
    let _span = info_span!(
        "validate",
        run_id = %config.run.run_id,
        strategy = %config.strategy.kind,
        symbol = %config.run.symbol
    )
    .entered();

    config.validate()?;
    let family = config.family()?;
    let timeframe = config.timeframe()?;
    let bars = load_bars(config, market_data)?;
    let (_, data_quality) = prepare_bars(bars, config.window()?, Some(timeframe.step_seconds));

    metrics::gauge!("meridian.validate.ohlcv.gaps").set(data_quality.gaps as f64);
    metrics::gauge!("meridian.validate.ohlcv.duplicates").set(data_quality.duplicates as f64);
    metrics::gauge!("meridian.validate.ohlcv.invalid_close")
        .set(data_quality.invalid_close as f64);

    if data_quality.kept_bars == 0 {
        return Err(BacktestError::EmptyBarSequence {
            symbol: config.run.symbol.clone(),
        }
        .into());
    }

    let warm_up_bars = family.build(&config.strategy.params)?.warm_up();
    if data_quality.kept_bars < warm_up_bars {
        warn!(
            kept_bars = data_quality.kept_bars,
            warm_up_bars, "not enough bars for the strategy to ever signal"
        );
    }

    let optimize_grid = config
        .optimize
        .as_ref()
        .map(|optimize| grid_size(&ranges_of(optimize)))
        .transpose()?;

    info!(kept_bars = data_quality.kept_bars, "validation passed");
    Ok(ValidationReport {
        run_id: config.run.run_id.clone(),
        strategy: family.label().to_string(),
        symbol: config.run.symbol.clone(),
        timeframe: timeframe.label,
        data_quality,
        warm_up_bars,
        batch_runs: config.batch.as_ref().map_or(0, |batch| batch.runs.len()),
        optimize_grid,
    })
}
