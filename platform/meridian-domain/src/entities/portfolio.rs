use crate::value_objects::position::Position;

/// Cash plus an ordered list of long lots. Owned by a single run.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    cash: f64,
    positions: Vec<Position>,
}

impl Portfolio {
    pub fn new_with_cash(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            positions: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn has_positions(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Always recomputed from cash and the live marks.
    pub fn total_value(&self) -> f64 {
        self.cash + self.positions.iter().map(Position::market_value).sum::<f64>()
    }

    /// Debits `quantity * price + commission` and appends a new lot.
    pub fn open_lot(
        &mut self,
        symbol: &str,
        quantity: i64,
        price: f64,
        commission: f64,
        timestamp: i64,
    ) {
        if quantity <= 0 {
            return;
        }
        self.cash -= quantity as f64 * price + commission;
        if self.cash < 0.0 && self.cash > -1e-6 {
            self.cash = 0.0;
        }
        self.positions.push(Position {
            symbol: symbol.to_string(),
            quantity,
            avg_price: price,
            current_price: price,
            open_timestamp: timestamp,
        });
    }

    /// Removes the first lot and credits `proceeds - commission`.
    pub fn close_first(&mut self, price: f64, commission_rate: f64) -> Option<ClosedLot> {
        let index = self.positions.iter().position(|pos| pos.quantity > 0)?;
        let lot = self.positions.remove(index);
        Some(self.settle(lot, price, commission_rate))
    }

    pub fn close_all(&mut self, price: f64, commission_rate: f64) -> Vec<ClosedLot> {
        let lots: Vec<Position> = self.positions.drain(..).collect();
        lots.into_iter()
            .map(|lot| self.settle(lot, price, commission_rate))
            .collect()
    }

    pub fn mark(&mut self, price: f64) {
        for pos in &mut self.positions {
            pos.current_price = price;
        }
    }

    fn settle(&mut self, lot: Position, price: f64, commission_rate: f64) -> ClosedLot {
        let proceeds = lot.quantity as f64 * price;
        let commission = proceeds * commission_rate;
        let pnl = (proceeds - commission) - lot.quantity as f64 * lot.avg_price;
        self.cash += proceeds - commission;
        ClosedLot {
            lot,
            commission,
            pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedLot {
    pub lot: Position,
    pub commission: f64,
    pub pnl: f64,
}
