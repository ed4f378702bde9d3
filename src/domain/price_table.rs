//! Price table indexed by `(day, symbol)` and its loader.

use crate::domain::error::DaytraderError;
use crate::domain::price_row::{PriceRow, Signals};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use log::warn;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Signals for one `(day, symbol)`, produced outside the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub day: NaiveDate,
    pub symbol: String,
    pub signals: Signals,
}

#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    rows: BTreeMap<NaiveDate, BTreeMap<String, PriceRow>>,
}

impl PriceTable {
    /// Later rows for the same `(day, symbol)` replace earlier ones.
    pub fn new(rows: impl IntoIterator<Item = PriceRow>) -> Self {
        let mut table = PriceTable::default();
        for mut row in rows {
            row.symbol = row.symbol.to_lowercase();
            table
                .rows
                .entry(row.day)
                .or_default()
                .insert(row.symbol.clone(), row);
        }
        table
    }

    /// Symbol lookups are case-insensitive.
    pub fn row(&self, day: NaiveDate, symbol: &str) -> Option<&PriceRow> {
        let symbol = symbol_key(symbol);
        self.rows
            .get(&day)
            .and_then(|by_symbol| by_symbol.get(&*symbol))
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.rows.keys().copied()
    }

    /// Rows traded on `day`, in symbol order.
    pub fn rows_on(&self, day: NaiveDate) -> impl Iterator<Item = &PriceRow> {
        self.rows.get(&day).into_iter().flat_map(|m| m.values())
    }

    pub fn symbols(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.rows.values().flat_map(|m| m.keys()).collect();
        set.into_iter().cloned().collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }

    /// Latest all-time-max close date across every row, or the last
    /// trading day when no row carries one.
    pub fn horizon(&self) -> Option<NaiveDate> {
        self.all_rows()
            .filter_map(|r| r.signals.all_time_max_close_date)
            .max()
            .or_else(|| self.last_day())
    }

    pub fn all_time_min_close_date(&self) -> Option<NaiveDate> {
        self.all_rows()
            .filter_map(|r| r.signals.all_time_min_close_date)
            .min()
    }

    pub fn last_close_on_or_before(&self, symbol: &str, day: NaiveDate) -> Option<f64> {
        let symbol = symbol_key(symbol);
        self.rows
            .range(..=day)
            .rev()
            .find_map(|(_, by_symbol)| by_symbol.get(&*symbol))
            .map(|row| row.close)
    }

    /// Overlay signals onto matching rows. Returns how many records had no
    /// matching row.
    pub fn attach_signals(&mut self, records: impl IntoIterator<Item = SignalRecord>) -> usize {
        let mut unmatched = 0;
        for record in records {
            let symbol = record.symbol.to_lowercase();
            match self
                .rows
                .get_mut(&record.day)
                .and_then(|by_symbol| by_symbol.get_mut(&symbol))
            {
                Some(row) => row.signals = record.signals,
                None => unmatched += 1,
            }
        }
        unmatched
    }

    fn all_rows(&self) -> impl Iterator<Item = &PriceRow> {
        self.rows.values().flat_map(|m| m.values())
    }
}

fn symbol_key(symbol: &str) -> Cow<'_, str> {
    if symbol.chars().any(char::is_uppercase) {
        Cow::Owned(symbol.to_lowercase())
    } else {
        Cow::Borrowed(symbol)
    }
}

/// Build a table from every symbol the port lists. Symbols whose source is
/// empty or unreadable are skipped.
pub fn load_price_table(port: &dyn DataPort) -> Result<PriceTable, DaytraderError> {
    let symbols = port.list_symbols()?;
    let mut rows = Vec::new();
    let mut loaded = 0usize;

    for symbol in &symbols {
        match port.fetch_bars(symbol) {
            Ok(bars) if bars.is_empty() => {
                warn!("skipping {symbol}: no rows");
            }
            Ok(bars) => {
                loaded += 1;
                rows.extend(bars);
            }
            Err(e) => {
                warn!("skipping {symbol}: {e}");
            }
        }
    }

    if loaded == 0 {
        return Err(DaytraderError::Data {
            reason: format!("none of {} symbols had usable data", symbols.len()),
        });
    }

    Ok(PriceTable::new(rows))
}
