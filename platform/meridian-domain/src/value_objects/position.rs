use serde::{Deserialize, Serialize};

/// An open long lot. Quantity stays strictly positive while the lot exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    pub avg_price: f64,
    pub current_price: f64,
    pub open_timestamp: i64,
}

impl Position {
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.current_price
    }

    pub fn unrealized_pnl(&self) -> f64 {
        (self.current_price - self.avg_price) * self.quantity as f64
    }
}
