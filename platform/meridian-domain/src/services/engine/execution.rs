use crate::entities::portfolio::{ClosedLot, Portfolio};
use crate::value_objects::bar::Bar;
use crate::value_objects::side::Side;
use crate::value_objects::signal::{Signal, SignalAction};
use crate::value_objects::trade::Trade;
use tracing::debug;

/// Fills signals at the bar close: all-in buys, first-lot sells, and a
/// single aggregated trade for `ClosePosition`.
#[derive(Debug)]
pub struct Execution {
    symbol: String,
    commission_rate: f64,
    next_trade_id: u64,
}

impl Execution {
    pub fn new(symbol: &str, commission_rate: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            commission_rate,
            next_trade_id: 1,
        }
    }

    pub fn apply(&mut self, portfolio: &mut Portfolio, signal: &Signal, bar: &Bar) -> Option<Trade> {
        match signal.action {
            SignalAction::Buy => self.buy(portfolio, signal, bar),
            SignalAction::Sell => {
                let closed = portfolio.close_first(bar.close, self.commission_rate)?;
                Some(self.record_sell(&[closed], signal, bar))
            }
            SignalAction::ClosePosition => {
                let closed = portfolio.close_all(bar.close, self.commission_rate);
                if closed.is_empty() {
                    return None;
                }
                Some(self.record_sell(&closed, signal, bar))
            }
            SignalAction::Hold => None,
        }
    }

    fn buy(&mut self, portfolio: &mut Portfolio, signal: &Signal, bar: &Bar) -> Option<Trade> {
        let price = bar.close;
        let commission = portfolio.cash() * self.commission_rate;
        let investable = portfolio.cash() - commission;
        let quantity = if price > 0.0 && investable > 0.0 {
            (investable / price).floor() as i64
        } else {
            0
        };
        if quantity <= 0 {
            debug!(
                timestamp = bar.timestamp,
                cash = portfolio.cash(),
                price,
                "buy rejected: nothing to invest"
            );
            return None;
        }

        portfolio.open_lot(&self.symbol, quantity, price, commission, bar.timestamp);
        let trade = Trade {
            id: self.next_id(),
            symbol: self.symbol.clone(),
            side: Side::Buy,
            quantity,
            price,
            timestamp: bar.timestamp,
            commission,
            pnl: 0.0,
            strategy_reasoning: signal.reasoning.clone(),
        };
        debug!(
            trade_id = trade.id,
            timestamp = trade.timestamp,
            quantity,
            price,
            commission,
            "buy filled"
        );
        Some(trade)
    }

    fn record_sell(&mut self, closed: &[ClosedLot], signal: &Signal, bar: &Bar) -> Trade {
        let quantity = closed.iter().map(|c| c.lot.quantity).sum();
        let commission = closed.iter().map(|c| c.commission).sum();
        let pnl = closed.iter().map(|c| c.pnl).sum();
        let trade = Trade {
            id: self.next_id(),
            symbol: self.symbol.clone(),
            side: Side::Sell,
            quantity,
            price: bar.close,
            timestamp: bar.timestamp,
            commission,
            pnl,
            strategy_reasoning: signal.reasoning.clone(),
        };
        debug!(
            trade_id = trade.id,
            timestamp = trade.timestamp,
            quantity,
            price = trade.price,
            pnl,
            lots = closed.len(),
            "sell filled"
        );
        trade
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_trade_id;
        self.next_trade_id += 1;
        id
    }
}
