use serde::{Deserialize, Serialize};
use std::fmt;

/// End-of-run statistics. Built once from the ledger and the equity curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    VeryPoor,
    Poor,
    Average,
    Good,
    Excellent,
}

impl Rating {
    pub fn from_score(score: u8) -> Self {
        match score {
            7.. => Rating::Excellent,
            5..=6 => Rating::Good,
            3..=4 => Rating::Average,
            1..=2 => Rating::Poor,
            0 => Rating::VeryPoor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "excellent",
            Rating::Good => "good",
            Rating::Average => "average",
            Rating::Poor => "poor",
            Rating::VeryPoor => "veryPoor",
        }
    }

    pub fn stars(&self) -> usize {
        match self {
            Rating::Excellent => 5,
            Rating::Good => 4,
            Rating::Average => 3,
            Rating::Poor => 2,
            Rating::VeryPoor => 1,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
