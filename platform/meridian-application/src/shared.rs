use crate::config::Config;
use crate::error::AppError;
use meridian_domain::entities::backtest_result::BacktestResult;
use meridian_domain::repositories::artifacts::ArtifactWriter;
use meridian_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use meridian_domain::services::analytics::recommendations;
use meridian_domain::services::ohlcv::DataQualityReport;
use meridian_domain::value_objects::bar::Bar;
use meridian_domain::value_objects::timestamp::format_timestamp;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Requested worker count, or the machine's available cores.
pub(crate) fn resolve_parallelism(requested: Option<usize>) -> usize {
    requested
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .max(1)
}

pub(crate) fn load_bars(
    config: &Config,
    market_data: &dyn MarketDataRepository,
) -> Result<Vec<Bar>, AppError> {
    let stage_start = Instant::now();
    let bars = market_data
        .load_bars(&OhlcvQuery {
            symbol: config.run.symbol.clone(),
            timeframe: config.timeframe()?,
            window: config.window()?,
        })
        .map_err(AppError::Port)?;
    metrics::histogram!("meridian.backtest.load_ohlcv_ms")
        .record(stage_start.elapsed().as_millis() as f64);
    Ok(bars)
}

pub(crate) fn resolve_out_dir(config: &Config, out: Option<PathBuf>) -> PathBuf {
    out.unwrap_or_else(|| PathBuf::from(&config.paths.out_dir))
}

#[derive(Debug, Clone)]
pub(crate) struct RunMeta<'a> {
    pub run_id: &'a str,
    pub timeframe: &'a str,
}

pub(crate) fn summary_json(
    result: &BacktestResult,
    meta: &RunMeta<'_>,
    data_quality: Option<&DataQualityReport>,
) -> serde_json::Value {
    serde_json::json!({
        "meta": {
            "run_id": meta.run_id,
            "strategy": result.strategy_name,
            "symbol": result.symbol,
            "timeframe": meta.timeframe,
            "start": result.date_range.start,
            "end": result.date_range.end,
            "start_utc": format_timestamp(result.date_range.start),
            "end_utc": format_timestamp(result.date_range.end),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        },
        "data_quality": data_quality,
        "initial_capital": result.initial_capital,
        "final_capital": result.final_capital,
        "bars_processed": result.daily_returns.len(),
        "metrics": result.metrics,
        "rating": result.rating.label(),
        "rating_score": result.rating_score,
        "stars": result.rating.stars(),
        "recommendations": recommendations(&result.metrics),
    })
}

/// `trades.csv`, `daily_returns.csv`, `summary.json` and `report.md` for one run.
pub(crate) fn write_run_artifacts(
    dir: &Path,
    result: &BacktestResult,
    summary: &serde_json::Value,
    artifacts: &dyn ArtifactWriter,
) -> Result<(), AppError> {
    artifacts.ensure_dir(dir).map_err(AppError::Port)?;
    artifacts
        .write_trades_csv(&dir.join("trades.csv"), &result.trades)
        .map_err(AppError::Port)?;
    artifacts
        .write_daily_returns_csv(&dir.join("daily_returns.csv"), &result.daily_returns)
        .map_err(AppError::Port)?;
    artifacts
        .write_summary_json(&dir.join("summary.json"), summary)
        .map_err(AppError::Port)?;
    artifacts
        .write_text(&dir.join("report.md"), &result.report)
        .map_err(AppError::Port)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::resolve_parallelism;

    #[test]
    fn parallelism_is_never_zero() {
        assert_eq!(resolve_parallelism(Some(0)), 1);
        assert_eq!(resolve_parallelism(Some(3)), 3);
        assert!(resolve_parallelism(None) >= 1);
    }
}
