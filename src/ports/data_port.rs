//! Price data access port.

use crate::domain::error::DaytraderError;
use crate::domain::price_row::PriceRow;

/// Source of per-symbol daily bars. Returned rows carry default signals.
pub trait DataPort {
    fn list_symbols(&self) -> Result<Vec<String>, DaytraderError>;

    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceRow>, DaytraderError>;
}
