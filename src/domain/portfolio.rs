//! Cash and share ledger.
//!
//! Every mutation goes through [`Portfolio::buy`] or [`Portfolio::sell`],
//! which validate fully before touching any state. Invariants:
//!
//! - `balance >= 0`
//! - every held count is strictly positive; symbols at zero are removed
//! - `history` is non-decreasing by day

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::LedgerError;
use super::price_row::PriceRow;
use super::price_table::PriceTable;
use super::transaction::{Side, Transaction, TransactionType};

pub const DEFAULT_INITIAL_BALANCE: f64 = 1.0;
pub const DEFAULT_VOLUME_CAP: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    balance: f64,
    holdings: BTreeMap<String, i64>,
    history: Vec<Transaction>,
    volume_cap: f64,
}

impl Default for Portfolio {
    fn default() -> Self {
        Portfolio::new(DEFAULT_INITIAL_BALANCE)
    }
}

impl Portfolio {
    pub fn new(initial_balance: f64) -> Self {
        Portfolio {
            balance: initial_balance,
            holdings: BTreeMap::new(),
            history: Vec::new(),
            volume_cap: DEFAULT_VOLUME_CAP,
        }
    }

    /// Largest order allowed, as a fraction of the day's volume.
    pub fn with_volume_cap(mut self, fraction: f64) -> Self {
        self.volume_cap = fraction;
        self
    }

    pub fn get_balance(&self) -> f64 {
        self.balance
    }

    pub fn get_holdings(&self) -> &BTreeMap<String, i64> {
        &self.holdings
    }

    pub fn held(&self, symbol: &str) -> i64 {
        self.holdings.get(symbol).copied().unwrap_or(0)
    }

    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.history.last().map(|t| t.day)
    }

    pub fn volume_cap(&self) -> f64 {
        self.volume_cap
    }

    /// Mark-to-market value of the holdings on `day`, each symbol priced at
    /// its latest close on or before that day.
    pub fn get_evaluation(&self, table: &PriceTable, day: NaiveDate) -> f64 {
        self.holdings
            .iter()
            .filter_map(|(symbol, &count)| {
                table
                    .last_close_on_or_before(symbol, day)
                    .map(|close| close * count as f64)
            })
            .sum()
    }

    pub fn net_worth(&self, table: &PriceTable, day: NaiveDate) -> f64 {
        self.balance + self.get_evaluation(table, day)
    }

    pub fn buy(
        &mut self,
        row: &PriceRow,
        transaction_type: TransactionType,
        count: i64,
    ) -> Result<(), LedgerError> {
        self.check_side(transaction_type, Side::Buy)?;
        self.check_count_and_day(row, count)?;
        self.check_volume_cap(row, count)?;

        let cost = count as f64 * row.price(transaction_type.price_field());
        if cost > self.balance {
            return Err(LedgerError::InsufficientFunds {
                cost,
                balance: self.balance,
            });
        }

        *self.holdings.entry(row.symbol.clone()).or_insert(0) += count;
        self.balance -= cost;
        self.record(row, transaction_type, count);
        Ok(())
    }

    pub fn sell(
        &mut self,
        row: &PriceRow,
        transaction_type: TransactionType,
        count: i64,
    ) -> Result<(), LedgerError> {
        self.check_side(transaction_type, Side::Sell)?;
        self.check_count_and_day(row, count)?;

        let held = self.held(&row.symbol);
        if count > held {
            return Err(LedgerError::InsufficientHoldings {
                symbol: row.symbol.clone(),
                count,
                held,
            });
        }
        self.check_volume_cap(row, count)?;

        let proceeds = count as f64 * row.price(transaction_type.price_field());
        if held == count {
            self.holdings.remove(&row.symbol);
        } else {
            self.holdings.insert(row.symbol.clone(), held - count);
        }
        self.balance += proceeds;
        self.record(row, transaction_type, count);
        Ok(())
    }

    /// Dispatch on the transaction type's side.
    pub fn apply(
        &mut self,
        row: &PriceRow,
        transaction_type: TransactionType,
        count: i64,
    ) -> Result<(), LedgerError> {
        match transaction_type.side() {
            Side::Buy => self.buy(row, transaction_type, count),
            Side::Sell => self.sell(row, transaction_type, count),
        }
    }

    fn check_side(&self, transaction_type: TransactionType, side: Side) -> Result<(), LedgerError> {
        if transaction_type.side() != side {
            return Err(LedgerError::InvalidTransactionType {
                transaction_type: transaction_type.to_string(),
                operation: match side {
                    Side::Buy => "buy",
                    Side::Sell => "sell",
                },
            });
        }
        Ok(())
    }

    fn check_count_and_day(&self, row: &PriceRow, count: i64) -> Result<(), LedgerError> {
        if count <= 0 {
            return Err(LedgerError::InvalidCount { count });
        }
        if let Some(last) = self.last_day() {
            if row.day < last {
                return Err(LedgerError::OutOfOrderDay { day: row.day, last });
            }
        }
        Ok(())
    }

    fn check_volume_cap(&self, row: &PriceRow, count: i64) -> Result<(), LedgerError> {
        let cap = self.volume_cap * row.volume as f64;
        if count as f64 > cap {
            return Err(LedgerError::VolumeCapExceeded {
                symbol: row.symbol.clone(),
                count,
                volume: row.volume,
                cap: self.volume_cap,
            });
        }
        Ok(())
    }

    fn record(&mut self, row: &PriceRow, transaction_type: TransactionType, count: i64) {
        self.history.push(Transaction {
            day: row.day,
            transaction_type,
            stock: row.symbol.clone(),
            count,
        });
    }
}
