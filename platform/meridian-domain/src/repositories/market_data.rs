use crate::services::ohlcv::BarWindow;
use crate::value_objects::bar::Bar;
use crate::value_objects::timeframe::Timeframe;

#[derive(Debug, Clone)]
pub struct OhlcvQuery {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub window: BarWindow,
}

/// Source of raw bars. Implementations return rows as stored; sorting,
/// de-duplication and range clipping happen in `prepare_bars`.
pub trait MarketDataRepository {
    fn load_bars(&self, query: &OhlcvQuery) -> Result<Vec<Bar>, String>;
}
