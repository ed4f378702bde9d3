//! Rebuild a ledger from a recorded transaction list.

use super::error::DaytraderError;
use super::portfolio::Portfolio;
use super::price_table::PriceTable;
use super::transaction::Transaction;

/// Replay onto a fresh default ledger. The first rejected transaction
/// aborts the replay.
pub fn evaluate_transactions(
    table: &PriceTable,
    transactions: &[Transaction],
) -> Result<Portfolio, DaytraderError> {
    replay_into(Portfolio::default(), table, transactions)
}

pub fn replay_into(
    mut portfolio: Portfolio,
    table: &PriceTable,
    transactions: &[Transaction],
) -> Result<Portfolio, DaytraderError> {
    for t in transactions {
        let row = table
            .row(t.day, &t.stock)
            .ok_or_else(|| DaytraderError::MissingPriceRow {
                day: t.day,
                symbol: t.stock.clone(),
            })?;
        portfolio.apply(row, t.transaction_type, t.count)?;
    }
    Ok(portfolio)
}
