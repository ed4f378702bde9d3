//! Plain-text transaction file.
//!
//! The first line holds the transaction count. Each following line is
//! `<day> <transaction_type> <SYMBOL> <count>`, space separated, with the
//! symbol upper-cased on write and lower-cased on read.

use crate::domain::error::{DaytraderError, TransactionParseError};
use crate::domain::transaction::{Transaction, TransactionType};
use crate::ports::transaction_port::TransactionStore;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct TransactionFile {
    path: PathBuf,
}

impl TransactionFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TransactionStore for TransactionFile {
    fn read(&self) -> Result<Vec<Transaction>, DaytraderError> {
        let content = fs::read_to_string(&self.path)?;
        parse_transactions(&content).map_err(|source| DaytraderError::TransactionParse {
            file: self.path.display().to_string(),
            source,
        })
    }

    fn write(&self, transactions: &[Transaction]) -> Result<(), DaytraderError> {
        fs::write(&self.path, format_transactions(transactions))?;
        Ok(())
    }
}

pub fn format_transactions(transactions: &[Transaction]) -> String {
    let body: String = transactions
        .iter()
        .map(|t| {
            format!(
                "{} {} {} {}\n",
                t.day,
                t.transaction_type,
                t.stock.to_uppercase(),
                t.count
            )
        })
        .collect();
    format!("{}\n{}", transactions.len(), body)
}

pub fn parse_transactions(content: &str) -> Result<Vec<Transaction>, TransactionParseError> {
    let mut lines = content.lines().enumerate();

    let (_, header) = lines.next().ok_or_else(|| TransactionParseError {
        line: 1,
        message: "missing transaction count".into(),
    })?;
    let expected: usize = header.trim().parse().map_err(|_| TransactionParseError {
        line: 1,
        message: format!("invalid transaction count: {}", header.trim()),
    })?;

    let mut transactions = Vec::with_capacity(expected);
    for (i, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        transactions.push(parse_line(line).map_err(|message| TransactionParseError {
            line: i + 1,
            message,
        })?);
    }

    if transactions.len() != expected {
        return Err(TransactionParseError {
            line: 1,
            message: format!(
                "header declares {} transactions, found {}",
                expected,
                transactions.len()
            ),
        });
    }
    Ok(transactions)
}

fn parse_line(line: &str) -> Result<Transaction, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let [day, transaction_type, stock, count] = parts.as_slice() else {
        return Err(format!("expected 4 fields, found {}", parts.len()));
    };

    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| format!("invalid day {}: {}", day, e))?;
    let transaction_type: TransactionType =
        transaction_type.parse().map_err(|e| format!("{}", e))?;
    let count = count
        .parse()
        .map_err(|e| format!("invalid count {}: {}", count, e))?;

    Ok(Transaction {
        day,
        transaction_type,
        stock: stock.to_lowercase(),
        count,
    })
}
