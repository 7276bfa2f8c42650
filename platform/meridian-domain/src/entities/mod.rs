pub mod backtest_result;
pub mod metrics;
pub mod portfolio;
