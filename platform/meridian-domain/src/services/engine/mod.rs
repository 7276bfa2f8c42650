pub mod backtest;
pub mod execution;
pub mod progress;
