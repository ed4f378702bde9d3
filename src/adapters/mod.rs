//! File-based implementations of the ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod signal_adapter;
pub mod transaction_file_adapter;
