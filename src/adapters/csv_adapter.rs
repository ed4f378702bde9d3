//! Per-symbol daily bar files.
//!
//! One `<symbol>.us.txt` file per symbol, comma separated, with a header
//! row `Date,Open,High,Low,Close,Volume[,OpenInt]`.

use crate::domain::error::DaytraderError;
use crate::domain::price_row::{PriceRow, Signals};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub const FILE_SUFFIX: &str = ".us.txt";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, FILE_SUFFIX))
    }
}

fn column<T: FromStr>(record: &StringRecord, index: usize, name: &str) -> Result<T, DaytraderError>
where
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| DaytraderError::Data {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| DaytraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn list_symbols(&self) -> Result<Vec<String>, DaytraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| DaytraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DaytraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(FILE_SUFFIX) {
                symbols.push(symbol.to_lowercase());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceRow>, DaytraderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| DaytraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| DaytraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date_str = record.get(0).ok_or_else(|| DaytraderError::Data {
                reason: "missing date column".into(),
            })?;
            let day = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                DaytraderError::Data {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            bars.push(PriceRow {
                day,
                symbol: symbol.to_lowercase(),
                open: column(&record, 1, "open")?,
                high: column(&record, 2, "high")?,
                low: column(&record, 3, "low")?,
                close: column(&record, 4, "close")?,
                volume: column(&record, 5, "volume")?,
                signals: Signals::default(),
            });
        }

        bars.sort_by_key(|b| b.day);
        Ok(bars)
    }
}
