//! Strategy signal file.
//!
//! CSV with a header row naming at least `Date,Name,WantToBuy,WantToSell,CanSell`.
//! `AllTimeMaxCloseDate` and `AllTimeMinCloseDate` are optional columns and
//! may be left blank.

use crate::domain::error::DaytraderError;
use crate::domain::price_row::Signals;
use crate::domain::price_table::SignalRecord;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::Path;

const REQUIRED: [&str; 5] = ["Date", "Name", "WantToBuy", "WantToSell", "CanSell"];

pub fn read_signals<P: AsRef<Path>>(path: P) -> Result<Vec<SignalRecord>, DaytraderError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| DaytraderError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;
    parse_signals(&content)
}

pub fn parse_signals(content: &str) -> Result<Vec<SignalRecord>, DaytraderError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| DaytraderError::Data {
            reason: format!("CSV parse error: {}", e),
        })?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let mut required = [0usize; 5];
    for (slot, name) in required.iter_mut().zip(REQUIRED) {
        *slot = position(name).ok_or_else(|| DaytraderError::Data {
            reason: format!("missing {} column", name),
        })?;
    }
    let [date_col, name_col, buy_col, sell_col, can_sell_col] = required;
    let max_date_col = position("AllTimeMaxCloseDate");
    let min_date_col = position("AllTimeMinCloseDate");

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| DaytraderError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let day = parse_date(field(&record, date_col))?.ok_or_else(|| DaytraderError::Data {
            reason: "empty Date value".into(),
        })?;
        let can_sell = parse_count(field(&record, can_sell_col), "CanSell")?;

        records.push(SignalRecord {
            day,
            symbol: field(&record, name_col).to_lowercase(),
            signals: Signals {
                want_to_buy: parse_flag(field(&record, buy_col), "WantToBuy")?,
                want_to_sell: parse_flag(field(&record, sell_col), "WantToSell")?,
                can_sell,
                all_time_max_close_date: match max_date_col {
                    Some(col) => parse_date(field(&record, col))?,
                    None => None,
                },
                all_time_min_close_date: match min_date_col {
                    Some(col) => parse_date(field(&record, col))?,
                    None => None,
                },
            },
        });
    }

    Ok(records)
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("").trim()
}

fn parse_flag(value: &str, name: &str) -> Result<bool, DaytraderError> {
    match value.to_lowercase().as_str() {
        "1" | "1.0" | "true" => Ok(true),
        "0" | "0.0" | "false" => Ok(false),
        other => Err(DaytraderError::Data {
            reason: format!("invalid {} value: {}", name, other),
        }),
    }
}

/// Whole share count, also accepting an integral float such as `120.0`.
fn parse_count(value: &str, name: &str) -> Result<i64, DaytraderError> {
    if let Ok(count) = value.parse::<i64>() {
        return Ok(count);
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(DaytraderError::Data {
            reason: format!("invalid {} value: {}", name, value),
        }),
    }
}

fn parse_date(value: &str) -> Result<Option<NaiveDate>, DaytraderError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| DaytraderError::Data {
            reason: format!("invalid date format: {}", e),
        })
}
