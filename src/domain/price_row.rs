//! Daily price row with attached strategy signals.

use chrono::NaiveDate;

use super::transaction::PriceField;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceRow {
    pub day: NaiveDate,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub signals: Signals,
}

/// Externally computed per-row strategy signals.
#[derive(Debug, Clone, PartialEq)]
pub struct Signals {
    pub want_to_buy: bool,
    pub want_to_sell: bool,
    /// Most shares of this symbol the strategy may still sell before the
    /// data ends.
    pub can_sell: i64,
    pub all_time_max_close_date: Option<NaiveDate>,
    pub all_time_min_close_date: Option<NaiveDate>,
}

impl Default for Signals {
    fn default() -> Self {
        Signals {
            want_to_buy: false,
            want_to_sell: false,
            can_sell: i64::MAX,
            all_time_max_close_date: None,
            all_time_min_close_date: None,
        }
    }
}

impl PriceRow {
    pub fn price(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }

    /// floor(fraction * volume)
    pub fn volume_cap(&self, fraction: f64) -> i64 {
        (fraction * self.volume as f64).floor() as i64
    }

    /// Fell to the low then closed there, with a real range.
    pub fn closes_at_low(&self) -> bool {
        self.low == self.close && self.high > self.low
    }

    /// Opened at the day's high, with a real range.
    pub fn opens_at_high(&self) -> bool {
        self.open == self.high && self.high > self.low
    }
}
