use crate::entities::metrics::PerformanceMetrics;
use crate::value_objects::daily_return::DailyReturn;
use crate::value_objects::trade::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const ANNUAL_RISK_FREE_RATE: f64 = 0.03;

/// Builds the end-of-run statistics. Every ratio falls back to 0 when its
/// denominator is 0 or undefined, so the output never carries NaN.
pub fn compute_metrics(
    trades: &[Trade],
    daily_returns: &[DailyReturn],
    initial_capital: f64,
) -> PerformanceMetrics {
    let total_pnl: f64 = trades.iter().map(|trade| trade.pnl).sum();
    let total_return = if initial_capital > 0.0 {
        total_pnl / initial_capital
    } else {
        0.0
    };
    let annualized_return = if daily_returns.is_empty() {
        0.0
    } else {
        total_return * (TRADING_DAYS_PER_YEAR / daily_returns.len() as f64)
    };

    let equity: Vec<f64> = daily_returns.iter().map(|d| d.portfolio_value).collect();
    let max_drawdown = max_drawdown(&equity);
    let rates = period_returns(&equity);
    let daily_rf = ANNUAL_RISK_FREE_RATE / TRADING_DAYS_PER_YEAR;
    let annualize = TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe_ratio = match sample_std(&rates) {
        Some(std) if std > 0.0 => (mean(&rates) - daily_rf) / std * annualize,
        _ => 0.0,
    };
    let downside: Vec<f64> = rates.iter().copied().filter(|r| *r < 0.0).collect();
    let sortino_ratio = match sample_std(&downside) {
        Some(std) if std > 0.0 => (mean(&rates) - daily_rf) / std * annualize,
        _ => 0.0,
    };
    let calmar_ratio = if max_drawdown == 0.0 {
        0.0
    } else {
        annualized_return / max_drawdown.abs()
    };
    let volatility = sample_std(&rates).map_or(0.0, |std| std * annualize);

    let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|p| *p > 0.0).collect();
    let losses: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|p| *p < 0.0).collect();
    let average_win = if wins.is_empty() { 0.0 } else { mean(&wins) };
    let average_loss = if losses.is_empty() { 0.0 } else { mean(&losses) };
    let profit_factor = if average_loss == 0.0 {
        0.0
    } else {
        (average_win / average_loss).abs()
    };

    PerformanceMetrics {
        total_return,
        annualized_return,
        sharpe_ratio: finite_or_zero(sharpe_ratio),
        sortino_ratio: finite_or_zero(sortino_ratio),
        calmar_ratio: finite_or_zero(calmar_ratio),
        max_drawdown,
        win_rate: if trades.is_empty() {
            0.0
        } else {
            wins.len() as f64 / trades.len() as f64
        },
        profit_factor,
        total_trades: trades.len(),
        winning_trades: wins.len(),
        losing_trades: losses.len(),
        average_win,
        average_loss,
        largest_win: wins.iter().copied().fold(0.0, f64::max),
        largest_loss: losses.iter().copied().fold(0.0, f64::min),
        volatility: finite_or_zero(volatility),
    }
}

/// `(v[i] - v[i-1]) / v[i-1]`, skipping non-positive bases.
pub fn period_returns(equity: &[f64]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|pair| pair[0] > 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect()
}

/// Largest peak-to-trough decline as a fraction of the running peak, in [0, 1].
fn max_drawdown(equity: &[f64]) -> f64 {
    let Some(first) = equity.first() else {
        return 0.0;
    };
    let mut peak = *first;
    let mut worst = 0.0f64;
    for value in equity {
        peak = peak.max(*value);
        if peak > 0.0 {
            worst = worst.max((peak - value) / peak);
        }
    }
    worst.clamp(0.0, 1.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation; `None` below two samples.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::compute_metrics;
    use crate::value_objects::daily_return::DailyReturn;
    use crate::value_objects::side::Side;
    use crate::value_objects::trade::Trade;

    fn day(timestamp: i64, value: f64) -> DailyReturn {
        DailyReturn {
            timestamp,
            portfolio_value: value,
            cash: value,
            open_positions: 0,
            daily_pnl: 0.0,
        }
    }

    fn sell(id: u64, pnl: f64) -> Trade {
        Trade {
            id,
            symbol: "BTCUSD".to_string(),
            side: Side::Sell,
            quantity: 1,
            price: 100.0,
            timestamp: id as i64,
            commission: 0.0,
            pnl,
            strategy_reasoning: String::new(),
        }
    }

    #[test]
    fn flat_curve_has_zero_risk_ratios() {
        let days: Vec<DailyReturn> = (0..10).map(|i| day(i, 1_000.0)).collect();
        let metrics = compute_metrics(&[], &days, 1_000.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert_eq!(metrics.sortino_ratio, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert_eq!(metrics.calmar_ratio, 0.0);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
    }

    #[test]
    fn drawdown_uses_running_peak() {
        let values = [100.0, 120.0, 90.0, 130.0, 117.0];
        let days: Vec<DailyReturn> = values
            .iter()
            .enumerate()
            .map(|(i, v)| day(i as i64, *v))
            .collect();
        let metrics = compute_metrics(&[], &days, 100.0);
        assert!((metrics.max_drawdown - 0.25).abs() < 1e-12);
    }

    #[test]
    fn trade_statistics() {
        let trades = vec![sell(1, 300.0), sell(2, -100.0), sell(3, 100.0), sell(4, -200.0)];
        let days: Vec<DailyReturn> = (0..4).map(|i| day(i, 10_000.0)).collect();
        let metrics = compute_metrics(&trades, &days, 10_000.0);
        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 2);
        assert_eq!(metrics.win_rate, 0.5);
        assert_eq!(metrics.average_win, 200.0);
        assert_eq!(metrics.average_loss, -150.0);
        assert!((metrics.profit_factor - 200.0 / 150.0).abs() < 1e-12);
        assert_eq!(metrics.largest_win, 300.0);
        assert_eq!(metrics.largest_loss, -200.0);
        assert!((metrics.total_return - 0.01).abs() < 1e-12);
        assert!((metrics.annualized_return - 0.01 * 63.0).abs() < 1e-12);
    }

    #[test]
    fn sharpe_and_sortino_on_a_noisy_curve() {
        let values = [100.0, 102.0, 101.0, 104.0, 103.0, 106.0];
        let days: Vec<DailyReturn> = values
            .iter()
            .enumerate()
            .map(|(i, v)| day(i as i64, *v))
            .collect();
        let metrics = compute_metrics(&[], &days, 100.0);
        assert!(metrics.sharpe_ratio > 0.0);
        assert!(metrics.sortino_ratio > 0.0);
        assert!(metrics.volatility > 0.0);
    }

    #[test]
    fn no_losses_means_zero_profit_factor() {
        let metrics = compute_metrics(&[sell(1, 50.0)], &[], 1_000.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.annualized_return, 0.0);
        assert_eq!(metrics.largest_loss, 0.0);
    }
}
