use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
    ClosePosition,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "buy",
            SignalAction::Sell => "sell",
            SignalAction::Hold => "hold",
            SignalAction::ClosePosition => "close_position",
        }
    }
}

/// A strategy decision for one bar. `confidence` is clamped to [0, 1] on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    pub confidence: f64,
    pub price: f64,
    pub reasoning: String,
    pub metadata: BTreeMap<String, Value>,
    pub timestamp: i64,
}

impl Signal {
    pub fn new(
        action: SignalAction,
        confidence: f64,
        price: f64,
        reasoning: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            action,
            confidence: clamp_confidence(confidence),
            price,
            reasoning: reasoning.into(),
            metadata: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn is_actionable(&self) -> bool {
        self.action != SignalAction::Hold
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
