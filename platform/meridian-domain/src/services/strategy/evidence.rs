use crate::value_objects::bar::Bar;
use crate::value_objects::signal::{clamp_confidence, Signal, SignalAction};
use serde_json::Value;
use std::collections::BTreeMap;

/// Additive bull/bear scoring for one bar. Each side is clamped to [0, 1].
#[derive(Debug, Default)]
pub(crate) struct Evidence {
    bull: f64,
    bear: f64,
    bull_reasons: Vec<String>,
    bear_reasons: Vec<String>,
    metadata: BTreeMap<String, Value>,
}

impl Evidence {
    pub(crate) fn new(sub_strategy: &str) -> Self {
        let mut evidence = Self::default();
        evidence.note("sub_strategy", sub_strategy);
        evidence
    }

    pub(crate) fn bull(&mut self, weight: f64, reason: impl Into<String>) {
        self.bull += weight;
        self.bull_reasons.push(reason.into());
    }

    pub(crate) fn bear(&mut self, weight: f64, reason: impl Into<String>) {
        self.bear += weight;
        self.bear_reasons.push(reason.into());
    }

    pub(crate) fn note(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }

    /// Emits the strictly stronger side when it reaches `min_confidence`.
    /// A tie, or both sides below the floor, yields no signal.
    pub(crate) fn decide(
        self,
        bar: &Bar,
        min_confidence: f64,
        exit_action: SignalAction,
    ) -> Option<Signal> {
        let bull = clamp_confidence(self.bull);
        let bear = clamp_confidence(self.bear);
        let (action, confidence, reasons) = if bull > bear {
            (SignalAction::Buy, bull, self.bull_reasons)
        } else if bear > bull {
            (exit_action, bear, self.bear_reasons)
        } else {
            return None;
        };
        if confidence < min_confidence {
            return None;
        }
        let mut signal = Signal::new(
            action,
            confidence,
            bar.close,
            reasons.join("; "),
            bar.timestamp,
        );
        signal.metadata = self.metadata;
        signal.metadata.insert("bull_score".to_string(), Value::from(bull));
        signal.metadata.insert("bear_score".to_string(), Value::from(bear));
        Some(signal)
    }
}

/// High/low/average volume of the `period` bars before the latest one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PriorChannel {
    pub high: f64,
    pub low: f64,
    pub avg_volume: f64,
}

pub(crate) fn prior_channel(bars: &[Bar], period: usize) -> Option<PriorChannel> {
    if period == 0 || bars.len() <= period {
        return None;
    }
    let window = &bars[bars.len() - 1 - period..bars.len() - 1];
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let avg_volume = window.iter().map(|b| b.volume).sum::<f64>() / period as f64;
    Some(PriorChannel {
        high,
        low,
        avg_volume,
    })
}

#[cfg(test)]
mod tests {
    use super::{prior_channel, Evidence};
    use crate::value_objects::bar::Bar;
    use crate::value_objects::signal::SignalAction;

    fn bar(timestamp: i64, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            symbol: "TEST".to_string(),
            timestamp,
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn confidence_accumulates_and_clamps() {
        let mut evidence = Evidence::new("momentum");
        evidence.bull(0.6, "a");
        evidence.bull(0.7, "b");
        evidence.bear(0.2, "c");
        let signal = evidence
            .decide(&bar(5, 1.0, 1.0, 1.0, 1.0), 0.5, SignalAction::Sell)
            .unwrap();
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.confidence, 1.0);
        assert_eq!(signal.reasoning, "a; b");
        assert_eq!(signal.timestamp, 5);
    }

    #[test]
    fn ties_and_weak_evidence_are_silent() {
        let mut tie = Evidence::new("x");
        tie.bull(0.6, "a");
        tie.bear(0.6, "b");
        assert!(tie.decide(&bar(0, 1.0, 1.0, 1.0, 1.0), 0.5, SignalAction::Sell).is_none());

        let mut weak = Evidence::new("x");
        weak.bear(0.3, "b");
        assert!(weak.decide(&bar(0, 1.0, 1.0, 1.0, 1.0), 0.5, SignalAction::Sell).is_none());
    }

    #[test]
    fn bear_side_uses_exit_action() {
        let mut evidence = Evidence::new("trend");
        evidence.bear(0.8, "death cross");
        let signal = evidence
            .decide(&bar(0, 1.0, 1.0, 1.0, 1.0), 0.5, SignalAction::ClosePosition)
            .unwrap();
        assert_eq!(signal.action, SignalAction::ClosePosition);
    }

    #[test]
    fn channel_excludes_latest_bar() {
        let bars = vec![
            bar(0, 10.0, 8.0, 9.0, 100.0),
            bar(1, 11.0, 9.0, 10.0, 300.0),
            bar(2, 50.0, 1.0, 40.0, 900.0),
        ];
        let channel = prior_channel(&bars, 2).unwrap();
        assert_eq!(channel.high, 11.0);
        assert_eq!(channel.low, 8.0);
        assert_eq!(channel.avg_volume, 200.0);
        assert!(prior_channel(&bars, 3).is_none());
    }
}
