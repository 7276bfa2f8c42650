use crate::error::AppError;
use crate::shared::{summary_json, RunMeta};
use meridian_domain::entities::backtest_result::{BacktestResult, DateRange};
use meridian_domain::errors::BacktestError;
use meridian_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use meridian_domain::services::analytics::{compute_metrics, rate, render_report};
use meridian_domain::value_objects::daily_return::DailyReturn;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span};

#[derive(Debug, Clone)]
pub struct GenerateReportResult {
    pub input_dir: PathBuf,
    pub run_id: String,
    pub result: BacktestResult,
}

/// Recomputes metrics, rating and the Markdown report of a finished run from
/// its `trades.csv` and `daily_returns.csv`, then rewrites `report.md` and
/// `summary.json`. Run metadata is carried over from the previous summary
/// when one exists.
pub fn generate_report(
    input_dir: &Path,
    reader: &dyn ArtifactReader,
    writer: &dyn ArtifactWriter,
) -> Result<GenerateReportResult, AppError> {
    let _span = info_span!("generate_report", input_dir = %input_dir.display()).entered();

    let stage_start = Instant::now();
    let trades_path = input_dir.join("trades.csv");
    let daily_path = input_dir.join("daily_returns.csv");
    let summary_path = input_dir.join("summary.json");

    if !reader.exists(&trades_path) || !reader.exists(&daily_path) {
        return Err(AppError::Port(format!(
            "missing trades.csv or daily_returns.csv in {}",
            input_dir.display()
        )));
    }

    let trades = reader.read_trades_csv(&trades_path).map_err(AppError::Port)?;
    let daily_returns = reader
        .read_daily_returns_csv(&daily_path)
        .map_err(AppError::Port)?;
    let previous = reader
        .read_summary_json(&summary_path)
        .map_err(AppError::Port)?;
    let meta = previous.as_ref().and_then(|summary| summary.get("meta"));
    let meta_str = |key: &str| {
        meta.and_then(|m| m.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let symbol = meta_str("symbol")
        .or_else(|| trades.first().map(|t| t.symbol.clone()))
        .unwrap_or_else(|| "unknown".to_string());
    let (Some(first), Some(last)) = (daily_returns.first(), daily_returns.last()) else {
        return Err(BacktestError::EmptyBarSequence { symbol }.into());
    };
    let date_range = DateRange {
        start: first.timestamp,
        end: last.timestamp,
    };
    let final_capital = last.portfolio_value;

    let initial_capital = previous
        .as_ref()
        .and_then(|summary| summary.get("initial_capital"))
        .and_then(|v| v.as_f64())
        .unwrap_or_else(|| initial_capital_from(first));
    let performance = compute_metrics(&trades, &daily_returns, initial_capital);
    let (rating_score, rating) = rate(&performance);

    let mut result = BacktestResult {
        strategy_name: meta_str("strategy").unwrap_or_else(|| "unknown".to_string()),
        symbol,
        date_range,
        initial_capital,
        final_capital,
        trades,
        metrics: performance,
        rating,
        rating_score,
        daily_returns,
        report: String::new(),
    };
    result.report = render_report(&result);
    metrics::histogram!("meridian.report.generate_ms")
        .record(stage_start.elapsed().as_millis() as f64);

    let run_id = meta_str("run_id").unwrap_or_else(|| {
        input_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    });
    let timeframe = meta_str("timeframe").unwrap_or_default();
    let mut summary = summary_json(
        &result,
        &RunMeta {
            run_id: &run_id,
            timeframe: &timeframe,
        },
        None,
    );
    if let (Some(data_quality), Some(obj)) = (
        previous.as_ref().and_then(|s| s.get("data_quality")),
        summary.as_object_mut(),
    ) {
        obj.insert("data_quality".to_string(), data_quality.clone());
    }

    writer
        .write_summary_json(&summary_path, &summary)
        .map_err(AppError::Port)?;
    writer
        .write_text(&input_dir.join("report.md"), &result.report)
        .map_err(AppError::Port)?;

    info!(
        run_id = %run_id,
        trades = result.trades.len(),
        bars = result.daily_returns.len(),
        "report regenerated"
    );
    Ok(GenerateReportResult {
        input_dir: input_dir.to_path_buf(),
        run_id,
        result,
    })
}

/// Value before the first bar's P&L was applied.
fn initial_capital_from(first: &DailyReturn) -> f64 {
    first.portfolio_value - first.daily_pnl
}

#[cfg(test)]
mod tests {
    use super::initial_capital_from;
    use meridian_domain::value_objects::daily_return::DailyReturn;

    #[test]
    fn initial_capital_is_recovered_from_the_first_row() {
        let first = DailyReturn {
            timestamp: 60,
            portfolio_value: 10_050.0,
            cash: 50.0,
            open_positions: 1,
            daily_pnl: 50.0,
        };
        assert_eq!(initial_capital_from(&first), 10_000.0);
    }
}
