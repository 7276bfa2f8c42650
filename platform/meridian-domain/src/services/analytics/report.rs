use crate::entities::backtest_result::BacktestResult;
use crate::entities::metrics::PerformanceMetrics;
use chrono::{TimeZone, Utc};

/// Advice bullets for each threshold the run misses.
pub fn recommendations(metrics: &PerformanceMetrics) -> Vec<String> {
    let mut out = Vec::new();
    if metrics.sharpe_ratio < 1.0 {
        out.push(format!(
            "Sharpe ratio {:.2} is below 1.0: returns do not compensate for volatility; tighten entry filters or reduce exposure.",
            metrics.sharpe_ratio
        ));
    }
    if metrics.max_drawdown > 0.2 {
        out.push(format!(
            "Max drawdown {:.1}% exceeds 20%: add stop-loss rules or smaller position sizes.",
            metrics.max_drawdown * 100.0
        ));
    }
    if metrics.win_rate < 0.4 {
        out.push(format!(
            "Win rate {:.1}% is below 40%: review signal confirmation and exit timing.",
            metrics.win_rate * 100.0
        ));
    }
    if metrics.profit_factor < 1.5 {
        out.push(format!(
            "Profit factor {:.2} is below 1.5: let winners run longer or cut losers earlier.",
            metrics.profit_factor
        ));
    }
    out
}

/// Markdown summary of a finished run.
pub fn render_report(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let stars = result.rating.stars();
    let mut out = format!("# Backtest Report: {}\n\n", result.strategy_name);

    out.push_str("## Overview\n");
    out.push_str(&format!("- Symbol: {}\n", result.symbol));
    out.push_str(&format!(
        "- Period: {} to {}\n",
        format_date(result.date_range.start),
        format_date(result.date_range.end)
    ));
    out.push_str(&format!("- Bars: {}\n", result.daily_returns.len()));
    out.push_str(&format!("- Initial capital: {:.2}\n", result.initial_capital));
    out.push_str(&format!("- Final capital: {:.2}\n\n", result.final_capital));

    out.push_str("## Returns\n");
    out.push_str(&format!("- Total return: {:.2}%\n", m.total_return * 100.0));
    out.push_str(&format!(
        "- Annualized return: {:.2}%\n\n",
        m.annualized_return * 100.0
    ));

    out.push_str("## Risk\n");
    out.push_str(&format!("- Sharpe ratio: {:.2}\n", m.sharpe_ratio));
    out.push_str(&format!("- Sortino ratio: {:.2}\n", m.sortino_ratio));
    out.push_str(&format!("- Calmar ratio: {:.2}\n", m.calmar_ratio));
    out.push_str(&format!("- Max drawdown: {:.2}%\n", m.max_drawdown * 100.0));
    out.push_str(&format!("- Volatility: {:.2}%\n\n", m.volatility * 100.0));

    out.push_str("## Trades\n");
    out.push_str(&format!(
        "- Total: {} ({} winning / {} losing)\n",
        m.total_trades, m.winning_trades, m.losing_trades
    ));
    out.push_str(&format!("- Win rate: {:.2}%\n", m.win_rate * 100.0));
    out.push_str(&format!("- Profit factor: {:.2}\n", m.profit_factor));
    out.push_str(&format!("- Average win: {:.2}\n", m.average_win));
    out.push_str(&format!("- Average loss: {:.2}\n", m.average_loss));
    out.push_str(&format!("- Largest win: {:.2}\n", m.largest_win));
    out.push_str(&format!("- Largest loss: {:.2}\n\n", m.largest_loss));

    out.push_str("## Rating\n");
    out.push_str(&format!(
        "{}{} {} ({}/8)\n\n",
        "★".repeat(stars),
        "☆".repeat(5 - stars),
        result.rating.label(),
        result.rating_score
    ));

    out.push_str("## Recommendations\n");
    let advice = recommendations(m);
    if advice.is_empty() {
        out.push_str("- All tracked thresholds are met.\n");
    }
    for line in advice {
        out.push_str(&format!("- {line}\n"));
    }
    out
}

fn format_date(timestamp: i64) -> String {
    match Utc.timestamp_opt(timestamp, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => timestamp.to_string(),
    }
}
