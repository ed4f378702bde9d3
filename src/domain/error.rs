//! Domain error types.

use chrono::NaiveDate;

/// A rejected ledger operation. The ledger is left untouched whenever one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid transaction type {transaction_type} for {operation}")]
    InvalidTransactionType {
        transaction_type: String,
        operation: &'static str,
    },

    #[error("count needs to be a positive integer, got {count}")]
    InvalidCount { count: i64 },

    #[error("transaction on {day} precedes last recorded transaction on {last}")]
    OutOfOrderDay { day: NaiveDate, last: NaiveDate },

    #[error("cannot trade {count} {symbol}: cap is {cap} of daily volume {volume}")]
    VolumeCapExceeded {
        symbol: String,
        count: i64,
        volume: i64,
        cap: f64,
    },

    #[error("cannot spend {cost} with a balance of {balance}")]
    InsufficientFunds { cost: f64, balance: f64 },

    #[error("cannot sell {count} {symbol}, holding {held}")]
    InsufficientHoldings {
        symbol: String,
        count: i64,
        held: i64,
    },
}

/// A malformed transaction record, with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct TransactionParseError {
    pub line: usize,
    pub message: String,
}

/// Top-level error type for daytrader.
#[derive(Debug, thiserror::Error)]
pub enum DaytraderError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("no price row for {symbol} on {day}")]
    MissingPriceRow { day: NaiveDate, symbol: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("transaction file {file}: {source}")]
    TransactionParse {
        file: String,
        source: TransactionParseError,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DaytraderError> for std::process::ExitCode {
    fn from(err: &DaytraderError) -> Self {
        let code: u8 = match err {
            DaytraderError::Io(_) => 1,
            DaytraderError::ConfigParse { .. }
            | DaytraderError::ConfigMissing { .. }
            | DaytraderError::ConfigInvalid { .. } => 2,
            DaytraderError::Data { .. } | DaytraderError::TransactionParse { .. } => 3,
            DaytraderError::Ledger(_) | DaytraderError::MissingPriceRow { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
