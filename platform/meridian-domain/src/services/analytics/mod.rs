mod performance;
mod rating;
mod report;

pub use performance::{compute_metrics, period_returns, TRADING_DAYS_PER_YEAR};
pub use rating::{rate, rating_score};
pub use report::{recommendations, render_report};
