use crate::entities::metrics::{PerformanceMetrics, Rating};
use crate::value_objects::daily_return::DailyReturn;
use crate::value_objects::trade::Trade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

/// Terminal output of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub symbol: String,
    pub date_range: DateRange,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub trades: Vec<Trade>,
    pub metrics: PerformanceMetrics,
    pub rating: Rating,
    pub rating_score: u8,
    pub daily_returns: Vec<DailyReturn>,
    pub report: String,
}
