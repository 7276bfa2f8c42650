pub mod bar;
pub mod daily_return;
pub mod parameter;
pub mod position;
pub mod side;
pub mod signal;
pub mod timeframe;
pub mod timestamp;
pub mod trade;
