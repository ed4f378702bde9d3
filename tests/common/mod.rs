#![allow(dead_code)]

use chrono::NaiveDate;
use daytrader::domain::error::DaytraderError;
pub use daytrader::domain::price_row::{PriceRow, Signals};
use daytrader::ports::data_port::DataPort;
use std::collections::BTreeMap;
use std::process::ExitCode;

pub struct MockDataPort {
    pub data: BTreeMap<String, Vec<PriceRow>>,
    pub errors: BTreeMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_rows(mut self, symbol: &str, rows: Vec<PriceRow>) -> Self {
        self.data.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn list_symbols(&self) -> Result<Vec<String>, DaytraderError> {
        Ok(self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect())
    }

    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceRow>, DaytraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(DaytraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Row on 2017-01-`d` with the given open/high/low/close.
pub fn make_row(symbol: &str, d: u32, ohlc: [f64; 4], volume: i64) -> PriceRow {
    PriceRow {
        day: date(2017, 1, d),
        symbol: symbol.to_string(),
        open: ohlc[0],
        high: ohlc[1],
        low: ohlc[2],
        close: ohlc[3],
        volume,
        signals: Signals::default(),
    }
}

pub fn wants_to_buy(mut row: PriceRow) -> PriceRow {
    row.signals.want_to_buy = true;
    row
}

pub fn wants_to_sell(mut row: PriceRow) -> PriceRow {
    row.signals.want_to_sell = true;
    row
}

pub fn can_sell(mut row: PriceRow, bound: i64) -> PriceRow {
    row.signals.can_sell = bound;
    row
}

/// Daily rows with a steady upward drift and no intraday shape.
pub fn generate_rows(symbol: &str, days: u32, start_price: f64, volume: i64) -> Vec<PriceRow> {
    (1..=days)
        .map(|d| {
            let p = start_price + d as f64 * 0.01;
            make_row(symbol, d, [p, p + 0.02, p - 0.02, p + 0.01], volume)
        })
        .collect()
}

pub fn is_success(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}
