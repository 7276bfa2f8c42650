use serde::{Deserialize, Serialize};

/// One OHLCV sample. `timestamp` is epoch seconds (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Column views over a bar slice, the shape the indicator functions consume.
#[derive(Debug, Default, Clone)]
pub struct BarColumns {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl BarColumns {
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut columns = Self {
            highs: Vec::with_capacity(bars.len()),
            lows: Vec::with_capacity(bars.len()),
            closes: Vec::with_capacity(bars.len()),
            volumes: Vec::with_capacity(bars.len()),
        };
        for bar in bars {
            columns.highs.push(bar.high);
            columns.lows.push(bar.low);
            columns.closes.push(bar.close);
            columns.volumes.push(bar.volume);
        }
        columns
    }

    pub fn view(&self) -> ColumnView<'_> {
        self.prefix(self.closes.len())
    }

    /// The first `len` rows, clamped to the available length.
    pub fn prefix(&self, len: usize) -> ColumnView<'_> {
        let len = len.min(self.closes.len());
        ColumnView {
            highs: &self.highs[..len],
            lows: &self.lows[..len],
            closes: &self.closes[..len],
            volumes: &self.volumes[..len],
        }
    }
}

/// Borrowed columns, so a growing prefix can be read without copying.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    pub highs: &'a [f64],
    pub lows: &'a [f64],
    pub closes: &'a [f64],
    pub volumes: &'a [f64],
}
