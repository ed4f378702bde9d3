//! Transactions and the price field each transaction type trades at.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

/// Which daily price a transaction executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    BuyOpen,
    BuyLow,
    BuyClose,
    SellOpen,
    SellHigh,
    SellClose,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::BuyOpen,
        TransactionType::BuyLow,
        TransactionType::BuyClose,
        TransactionType::SellOpen,
        TransactionType::SellHigh,
        TransactionType::SellClose,
    ];

    pub fn side(self) -> Side {
        match self {
            TransactionType::BuyOpen | TransactionType::BuyLow | TransactionType::BuyClose => {
                Side::Buy
            }
            TransactionType::SellOpen | TransactionType::SellHigh | TransactionType::SellClose => {
                Side::Sell
            }
        }
    }

    pub fn price_field(self) -> PriceField {
        match self {
            TransactionType::BuyOpen | TransactionType::SellOpen => PriceField::Open,
            TransactionType::BuyLow => PriceField::Low,
            TransactionType::SellHigh => PriceField::High,
            TransactionType::BuyClose | TransactionType::SellClose => PriceField::Close,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::BuyOpen => "buy-open",
            TransactionType::BuyLow => "buy-low",
            TransactionType::BuyClose => "buy-close",
            TransactionType::SellOpen => "sell-open",
            TransactionType::SellHigh => "sell-high",
            TransactionType::SellClose => "sell-close",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transaction type: {0}")]
pub struct UnknownTransactionType(pub String);

impl FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTransactionType(s.to_string()))
    }
}

/// An executed trade. Append-only once recorded in a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub day: NaiveDate,
    pub transaction_type: TransactionType,
    pub stock: String,
    pub count: i64,
}
