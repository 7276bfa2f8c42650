use serde::{Deserialize, Serialize};

/// Per-bar snapshot of the portfolio; one entry for every replayed bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub timestamp: i64,
    pub portfolio_value: f64,
    pub cash: f64,
    pub open_positions: usize,
    pub daily_pnl: f64,
}
