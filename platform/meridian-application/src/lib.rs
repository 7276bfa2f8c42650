pub mod backtesting;
pub mod config;
pub mod error;
pub mod experiments;
pub mod reporting;
mod shared;
pub mod validation;
