use meridian_application::config::Config;
use meridian_application::error::AppError;
use meridian_domain::entities::backtest_result::BacktestResult;

pub(super) fn print_config_summary(command: &str, config: &Config) -> Result<(), AppError> {
    println!(
        "meridian cli: {} (run_id={}, symbol={}, strategy={}, timeframe={}, initial_capital={})",
        command,
        config.run.run_id,
        config.run.symbol,
        config.strategy.kind,
        config.timeframe()?,
        config.run.initial_capital
    );
    println!(
        "data: ohlcv={}, out_dir={}, commission_rate={}",
        config.data.ohlcv_csv,
        config.paths.out_dir,
        config.commission_rate()
    );
    Ok(())
}

pub(super) fn print_result_line(label: &str, result: &BacktestResult) {
    let m = &result.metrics;
    println!(
        "{label}: final_capital={:.2} return={:.2}% sharpe={:.3} max_dd={:.2}% trades={} rating={} ({}/5)",
        result.final_capital,
        m.total_return * 100.0,
        m.sharpe_ratio,
        m.max_drawdown * 100.0,
        m.total_trades,
        result.rating.label(),
        result.rating.stars()
    );
}
