pub mod batch;
pub mod optimize;
mod pool;

use crate::error::AppError;
use std::path::Path;

/// Renders a CSV table in memory so it can go through the artifact port.
fn csv_text(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<String, AppError> {
    let csv_err = |source: csv::Error| AppError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(header).map_err(csv_err)?;
    for row in rows {
        wtr.write_record(row).map_err(csv_err)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|err| csv_err(csv::Error::from(err.into_error())))?;
    String::from_utf8(bytes)
        .map_err(|err| AppError::Port(format!("failed to encode {}: {err}", path.display())))
}
