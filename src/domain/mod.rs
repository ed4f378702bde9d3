//! Core domain types and logic: ledger, price table, trading engine, replay.

pub mod transaction;
pub mod price_row;
pub mod price_table;
pub mod portfolio;
pub mod trader;
pub mod replay;
pub mod simulation;
pub mod config_validation;
pub mod error;
