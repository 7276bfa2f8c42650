use crate::reporting;
use meridian_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use meridian_domain::value_objects::daily_return::DailyReturn;
use meridian_domain::value_objects::trade::Trade;
use std::fs;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactWriter;

impl FilesystemArtifactWriter {
    pub fn new() -> Self {
        Self
    }
}

fn record_write_metrics(kind: &'static str, start: Instant, result: &Result<(), String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "meridian.infra.artifacts.write.calls_total",
        "kind" => kind,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("meridian.infra.artifacts.write_ms", "kind" => kind, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

fn record_read_metrics<T>(kind: &'static str, start: Instant, result: &Result<T, String>) {
    let result_label = if result.is_ok() { "ok" } else { "err" };
    metrics::counter!(
        "meridian.infra.artifacts.read.calls_total",
        "kind" => kind,
        "result" => result_label
    )
    .increment(1);
    metrics::histogram!("meridian.infra.artifacts.read_ms", "kind" => kind, "result" => result_label)
        .record(start.elapsed().as_millis() as f64);
}

impl ArtifactWriter for FilesystemArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        let start = Instant::now();
        let result = fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err));
        record_write_metrics("ensure_dir", start, &result);
        result
    }

    fn write_trades_csv(&self, path: &Path, trades: &[Trade]) -> Result<(), String> {
        let start = Instant::now();
        let result = reporting::write_trades_csv(path, trades);
        record_write_metrics("trades_csv", start, &result);
        result
    }

    fn write_daily_returns_csv(&self, path: &Path, rows: &[DailyReturn]) -> Result<(), String> {
        let start = Instant::now();
        let result = reporting::write_daily_returns_csv(path, rows);
        record_write_metrics("daily_returns_csv", start, &result);
        result
    }

    fn write_summary_json(&self, path: &Path, summary: &serde_json::Value) -> Result<(), String> {
        let start = Instant::now();
        let result = reporting::write_json(path, summary);
        record_write_metrics("summary_json", start, &result);
        result
    }

    fn write_text(&self, path: &Path, contents: &str) -> Result<(), String> {
        let start = Instant::now();
        let result = fs::write(path, contents)
            .map_err(|err| format!("failed to write {}: {}", path.display(), err));
        record_write_metrics("text", start, &result);
        result
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemArtifactReader;

impl FilesystemArtifactReader {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactReader for FilesystemArtifactReader {
    fn read_trades_csv(&self, path: &Path) -> Result<Vec<Trade>, String> {
        let start = Instant::now();
        let result = reporting::read_trades_csv(path);
        record_read_metrics("trades_csv", start, &result);
        result
    }

    fn read_daily_returns_csv(&self, path: &Path) -> Result<Vec<DailyReturn>, String> {
        let start = Instant::now();
        let result = reporting::read_daily_returns_csv(path);
        record_read_metrics("daily_returns_csv", start, &result);
        result
    }

    fn read_summary_json(&self, path: &Path) -> Result<Option<serde_json::Value>, String> {
        let start = Instant::now();
        if !path.exists() {
            record_read_metrics(
                "summary_json",
                start,
                &Ok::<Option<serde_json::Value>, String>(None),
            );
            return Ok(None);
        }
        let result = fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {}", path.display(), err))
            .and_then(|raw| {
                serde_json::from_str(&raw)
                    .map(Some)
                    .map_err(|err| format!("failed to parse {}: {}", path.display(), err))
            });
        record_read_metrics("summary_json", start, &result);
        result
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::{FilesystemArtifactReader, FilesystemArtifactWriter};
    use meridian_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("meridian_{prefix}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn summary_round_trips_and_missing_is_none() {
        let dir = unique_tmp_dir("artifacts").join("nested");
        let writer = FilesystemArtifactWriter::new();
        let reader = FilesystemArtifactReader::new();
        writer.ensure_dir(&dir).expect("dir");

        let path = dir.join("summary.json");
        assert_eq!(reader.read_summary_json(&path).expect("read"), None);

        let summary = serde_json::json!({"rating": "good", "rating_score": 5});
        writer.write_summary_json(&path, &summary).expect("write");
        assert!(reader.exists(&path));
        assert_eq!(reader.read_summary_json(&path).expect("read"), Some(summary));

        writer.write_text(&dir.join("report.md"), "# Report\n").expect("text");
        assert!(reader.exists(&dir.join("report.md")));
    }
}
