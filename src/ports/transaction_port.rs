//! Transaction persistence port.

use crate::domain::error::DaytraderError;
use crate::domain::transaction::Transaction;

/// Reads and writes a transaction list. Symbols come back lower-case.
pub trait TransactionStore {
    fn read(&self) -> Result<Vec<Transaction>, DaytraderError>;

    fn write(&self, transactions: &[Transaction]) -> Result<(), DaytraderError>;
}
