use crate::value_objects::daily_return::DailyReturn;
use crate::value_objects::trade::Trade;
use std::path::Path;

pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_trades_csv(&self, path: &Path, trades: &[Trade]) -> Result<(), String>;
    fn write_daily_returns_csv(&self, path: &Path, rows: &[DailyReturn]) -> Result<(), String>;
    fn write_summary_json(&self, path: &Path, summary: &serde_json::Value) -> Result<(), String>;
    fn write_text(&self, path: &Path, contents: &str) -> Result<(), String>;
}

pub trait ArtifactReader {
    fn read_trades_csv(&self, path: &Path) -> Result<Vec<Trade>, String>;
    fn read_daily_returns_csv(&self, path: &Path) -> Result<Vec<DailyReturn>, String>;
    fn read_summary_json(&self, path: &Path) -> Result<Option<serde_json::Value>, String>;
    fn exists(&self, path: &Path) -> bool;
}
