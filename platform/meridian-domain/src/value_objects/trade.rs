use crate::value_objects::side::Side;
use serde::{Deserialize, Serialize};

/// Append-only ledger entry. `pnl` is realized on sells and zero on buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub price: f64,
    pub timestamp: i64,
    pub commission: f64,
    pub pnl: f64,
    pub strategy_reasoning: String,
}

impl Trade {
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}
