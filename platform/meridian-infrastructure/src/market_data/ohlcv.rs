use meridian_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
use meridian_domain::value_objects::bar::Bar;
use meridian_domain::value_objects::timestamp::parse_timestamp;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct OhlcvRecord {
    pub timestamp_utc: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Rows come back in file order and tagged with `symbol`; cleaning is left
/// to `prepare_bars`.
pub fn load_csv(path: &Path, symbol: &str) -> Result<Vec<Bar>, String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open OHLCV CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut bars = Vec::new();
    for (row, result) in reader.deserialize::<OhlcvRecord>().enumerate() {
        let record = result.map_err(|err| format!("failed to parse CSV row {}: {}", row + 1, err))?;
        let timestamp = parse_timestamp(&record.timestamp_utc)
            .map_err(|err| format!("row {}: {}", row + 1, err))?;
        bars.push(Bar {
            symbol: symbol.to_string(),
            timestamp,
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: record.volume,
        });
    }
    Ok(bars)
}

/// One CSV file per run; the query's symbol tags every bar.
#[derive(Debug, Clone)]
pub struct CsvMarketDataRepository {
    path: PathBuf,
}

impl CsvMarketDataRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarketDataRepository for CsvMarketDataRepository {
    fn load_bars(&self, query: &OhlcvQuery) -> Result<Vec<Bar>, String> {
        let start = Instant::now();
        let result = load_csv(&self.path, &query.symbol);
        let result_label = if result.is_ok() { "ok" } else { "err" };
        metrics::histogram!("meridian.infra.ohlcv.load_ms", "result" => result_label)
            .record(start.elapsed().as_millis() as f64);
        if let Ok(bars) = &result {
            debug!(
                path = %self.path.display(),
                symbol = %query.symbol,
                timeframe = %query.timeframe,
                rows = bars.len(),
                "loaded OHLCV CSV"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{load_csv, CsvMarketDataRepository};
    use meridian_domain::repositories::market_data::{MarketDataRepository, OhlcvQuery};
    use meridian_domain::services::ohlcv::BarWindow;
    use meridian_domain::value_objects::timeframe::Timeframe;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("meridian_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn reads_epoch_and_rfc3339_rows_in_file_order() {
        let path = unique_tmp_path("ohlcv_mixed.csv");
        let csv_data = "timestamp_utc,open,high,low,close,volume\n\
1704153600,2,2,2,2,20\n\
2024-01-01T00:00:00Z,1,1.5,0.5,1.2,10\n";
        fs::write(&path, csv_data).expect("write csv");

        let bars = load_csv(&path, "BTCUSD").expect("load csv");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1_704_153_600);
        assert_eq!(bars[1].timestamp, 1_704_067_200);
        assert_eq!(bars[1].high, 1.5);
        assert!(bars.iter().all(|bar| bar.symbol == "BTCUSD"));
    }

    #[test]
    fn bad_timestamp_names_the_row() {
        let path = unique_tmp_path("ohlcv_bad_ts.csv");
        fs::write(
            &path,
            "timestamp_utc,open,high,low,close,volume\nnot-a-date,1,1,1,1,1\n",
        )
        .expect("write csv");

        let err = load_csv(&path, "BTCUSD").unwrap_err();
        assert!(err.starts_with("row 1:"), "{err}");
    }

    #[test]
    fn repository_reports_missing_files() {
        let repo = CsvMarketDataRepository::new(unique_tmp_path("missing.csv"));
        let err = repo
            .load_bars(&OhlcvQuery {
                symbol: "BTCUSD".to_string(),
                timeframe: Timeframe::one_day(),
                window: BarWindow::default(),
            })
            .unwrap_err();
        assert!(err.contains("failed to open OHLCV CSV"));
    }
}
