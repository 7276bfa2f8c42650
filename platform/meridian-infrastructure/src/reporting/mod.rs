use meridian_domain::value_objects::daily_return::DailyReturn;
use meridian_domain::value_objects::side::Side;
use meridian_domain::value_objects::trade::Trade;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub fn write_trades_csv(path: &Path, trades: &[Trade]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create trades csv {}: {}", path.display(), err))?;
    wtr.write_record([
        "id",
        "timestamp_utc",
        "symbol",
        "side",
        "qty",
        "price",
        "commission",
        "pnl",
        "reason",
    ])
    .map_err(|err| format!("failed to write trades csv header: {}", err))?;

    for trade in trades {
        wtr.write_record([
            trade.id.to_string(),
            trade.timestamp.to_string(),
            trade.symbol.clone(),
            trade.side.as_str().to_string(),
            trade.quantity.to_string(),
            trade.price.to_string(),
            trade.commission.to_string(),
            trade.pnl.to_string(),
            trade.strategy_reasoning.clone(),
        ])
        .map_err(|err| format!("failed to write trades row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush trades csv: {}", err))
}

pub fn write_daily_returns_csv(path: &Path, rows: &[DailyReturn]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path).map_err(|err| {
        format!(
            "failed to create daily returns csv {}: {}",
            path.display(),
            err
        )
    })?;
    wtr.write_record([
        "timestamp_utc",
        "portfolio_value",
        "cash",
        "open_positions",
        "daily_pnl",
    ])
    .map_err(|err| format!("failed to write daily returns csv header: {}", err))?;

    for row in rows {
        wtr.write_record([
            row.timestamp.to_string(),
            row.portfolio_value.to_string(),
            row.cash.to_string(),
            row.open_positions.to_string(),
            row.daily_pnl.to_string(),
        ])
        .map_err(|err| format!("failed to write daily returns row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush daily returns csv: {}", err))
}

pub fn write_json(path: &Path, value: &serde_json::Value) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| format!("failed to serialize {}: {}", path.display(), err))?;
    fs::write(path, json).map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

#[derive(Debug, Clone, Deserialize)]
struct TradeRecord {
    id: u64,
    timestamp_utc: i64,
    symbol: String,
    side: String,
    qty: i64,
    price: f64,
    commission: f64,
    pnl: f64,
    reason: String,
}

pub fn read_trades_csv(path: &Path) -> Result<Vec<Trade>, String> {
    let mut rdr = csv::Reader::from_path(path)
        .map_err(|err| format!("failed to open trades csv {}: {}", path.display(), err))?;
    let mut trades = Vec::new();
    for result in rdr.deserialize::<TradeRecord>() {
        let record = result.map_err(|err| format!("failed to parse trade record: {}", err))?;
        let side = Side::parse(&record.side)
            .ok_or_else(|| format!("invalid side '{}'", record.side))?;
        trades.push(Trade {
            id: record.id,
            symbol: record.symbol,
            side,
            quantity: record.qty,
            price: record.price,
            timestamp: record.timestamp_utc,
            commission: record.commission,
            pnl: record.pnl,
            strategy_reasoning: record.reason,
        });
    }
    Ok(trades)
}

#[derive(Debug, Clone, Deserialize)]
struct DailyReturnRecord {
    timestamp_utc: i64,
    portfolio_value: f64,
    cash: f64,
    open_positions: usize,
    daily_pnl: f64,
}

pub fn read_daily_returns_csv(path: &Path) -> Result<Vec<DailyReturn>, String> {
    let mut rdr = csv::Reader::from_path(path).map_err(|err| {
        format!(
            "failed to open daily returns csv {}: {}",
            path.display(),
            err
        )
    })?;
    let mut rows = Vec::new();
    for result in rdr.deserialize::<DailyReturnRecord>() {
        let record =
            result.map_err(|err| format!("failed to parse daily return record: {}", err))?;
        rows.push(DailyReturn {
            timestamp: record.timestamp_utc,
            portfolio_value: record.portfolio_value,
            cash: record.cash,
            open_positions: record.open_positions,
            daily_pnl: record.daily_pnl,
        });
    }
    Ok(rows)
}
