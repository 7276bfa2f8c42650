use crate::errors::DataError;
use crate::value_objects::bar::Bar;
use serde::Serialize;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub input_bars: usize,
    pub kept_bars: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub out_of_range: usize,
    pub gaps: usize,
    pub max_gap_seconds: Option<i64>,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
}

/// Inclusive timestamp bounds; `None` leaves that side open.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BarWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl BarWindow {
    pub fn new(start: Option<i64>, end: Option<i64>) -> Result<Self, DataError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(DataError::InvalidRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start.map_or(true, |start| timestamp >= start)
            && self.end.map_or(true, |end| timestamp <= end)
    }
}

/// Sorts ascending, keeps the first bar per timestamp, drops non-finite or
/// non-positive closes, then clips to `window`. Gaps are measured against
/// `expected_step_seconds` on the kept bars.
pub fn prepare_bars(
    bars: Vec<Bar>,
    window: BarWindow,
    expected_step_seconds: Option<i64>,
) -> (Vec<Bar>, DataQualityReport) {
    let mut report = DataQualityReport {
        input_bars: bars.len(),
        ..DataQualityReport::default()
    };
    report.out_of_order = bars
        .windows(2)
        .filter(|pair| pair[1].timestamp < pair[0].timestamp)
        .count();

    let mut bars = bars;
    // Stable sort keeps the first-seen bar ahead of its duplicates.
    bars.sort_by_key(|bar| bar.timestamp);

    let mut kept: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        if kept.last().is_some_and(|prev| prev.timestamp == bar.timestamp) {
            report.duplicates += 1;
            continue;
        }
        if !bar.close.is_finite() || bar.close <= 0.0 {
            report.invalid_close += 1;
            continue;
        }
        if !window.contains(bar.timestamp) {
            report.out_of_range += 1;
            continue;
        }
        kept.push(bar);
    }

    if let Some(step) = expected_step_seconds.filter(|step| *step > 0) {
        for pair in kept.windows(2) {
            let diff = pair[1].timestamp - pair[0].timestamp;
            if diff > step {
                report.gaps += 1;
                report.max_gap_seconds =
                    Some(report.max_gap_seconds.map_or(diff, |current| current.max(diff)));
            }
        }
    }

    report.kept_bars = kept.len();
    report.first_timestamp = kept.first().map(|bar| bar.timestamp);
    report.last_timestamp = kept.last().map(|bar| bar.timestamp);
    (kept, report)
}
