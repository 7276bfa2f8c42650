use crate::entities::metrics::{PerformanceMetrics, Rating};

/// 0-8 points: up to 2 each for return, Sharpe and drawdown, 1 each for win
/// rate and profit factor.
pub fn rating_score(metrics: &PerformanceMetrics) -> u8 {
    let mut score = 0;
    score += if metrics.annualized_return > 0.2 {
        2
    } else if metrics.annualized_return > 0.1 {
        1
    } else {
        0
    };
    score += if metrics.sharpe_ratio > 2.0 {
        2
    } else if metrics.sharpe_ratio > 1.0 {
        1
    } else {
        0
    };
    score += if metrics.max_drawdown < 0.1 {
        2
    } else if metrics.max_drawdown < 0.2 {
        1
    } else {
        0
    };
    if metrics.win_rate > 0.6 {
        score += 1;
    }
    if metrics.profit_factor > 2.0 {
        score += 1;
    }
    score
}

pub fn rate(metrics: &PerformanceMetrics) -> (u8, Rating) {
    let score = rating_score(metrics);
    (score, Rating::from_score(score))
}
