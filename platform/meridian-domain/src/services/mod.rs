pub mod analytics;
pub mod engine;
pub mod indicators;
pub mod ohlcv;
pub mod strategy;
