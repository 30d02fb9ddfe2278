//! CSV table access and cell parsers shared by the dataset builders.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{Error, Result};

/// A parsed CSV sheet: trimmed header names plus raw records.
pub(crate) struct Table {
    pub headers: Vec<String>,
    columns: HashMap<String, usize>,
    records: Vec<csv::StringRecord>,
}

impl Table {
    pub fn parse(csv_text: &str, label: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(csv_text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::bundle_invalid_data(format!("{} CSV: {}", label, e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(Error::bundle_invalid_data(format!(
                "{} CSV has no header row.",
                label
            )));
        }

        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::bundle_invalid_data(format!("{} CSV: {}", label, e)))?;

        Ok(Self {
            headers,
            columns,
            records,
        })
    }

    pub fn require_headers(&self, required: &[&str], label: &str) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|h| !self.columns.contains_key(*h))
            .collect();
        if !missing.is_empty() {
            return Err(Error::bundle_invalid_data(format!(
                "{} missing required headers: {:?}",
                label, missing
            )));
        }
        Ok(())
    }

    /// Data rows paired with their spreadsheet line number (header is line 1).
    pub fn rows(&self) -> impl Iterator<Item = (usize, Row<'_>)> {
        self.records.iter().enumerate().map(move |(i, record)| {
            (
                i + 2,
                Row {
                    columns: &self.columns,
                    record,
                },
            )
        })
    }
}

pub(crate) struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    /// Raw cell text; missing columns and short rows read as "".
    pub fn get(&self, column: &str) -> &'a str {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }

    pub fn trimmed(&self, column: &str) -> &'a str {
        self.get(column).trim()
    }
}

pub(crate) fn invalid(row_id: &str, problem: impl std::fmt::Display) -> Error {
    Error::bundle_invalid_data(format!("[{}] {}", row_id, problem))
}

/// Required multiplier-style number in `0..=10`.
pub(crate) fn parse_number(value: &str, field: &str, row_id: &str) -> Result<f64> {
    let v = value.trim();
    if v.is_empty() {
        return Err(invalid(row_id, format!("{} is blank (must be a number).", field)));
    }
    let n: f64 = v
        .parse()
        .ok()
        .filter(|n: &f64| n.is_finite())
        .ok_or_else(|| invalid(row_id, format!("{}='{}' is not a valid number.", field, value)))?;
    check_range(n, field, row_id)?;
    // normalizes -0
    Ok(if n == 0.0 { 0.0 } else { n })
}

pub(crate) fn check_range(n: f64, field: &str, row_id: &str) -> Result<()> {
    if !(0.0..=10.0).contains(&n) {
        return Err(invalid(
            row_id,
            format!("{}={} out of allowed range 0..10.", field, n),
        ));
    }
    Ok(())
}

pub(crate) fn parse_optional_number(value: &str, row_id: &str) -> Result<Option<f64>> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    v.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| invalid(row_id, format!("Invalid number: '{}'", value)))
}

/// Optional integer; decimal input is truncated toward zero.
pub(crate) fn parse_optional_int(value: &str, row_id: &str) -> Result<Option<i64>> {
    Ok(parse_optional_number(value, row_id)
        .map_err(|_| invalid(row_id, format!("Invalid integer: '{}'", value)))?
        .map(|n| n.trunc() as i64))
}

/// `YYYY-MM-DD`; when `not_after` is given the date may not be later.
pub(crate) fn validate_date(
    value: &str,
    field: &str,
    row_id: &str,
    not_after: Option<NaiveDate>,
) -> Result<NaiveDate> {
    let v = value.trim();
    let date = NaiveDate::parse_from_str(v, "%Y-%m-%d")
        .map_err(|_| invalid(row_id, format!("{}='{}' must be YYYY-MM-DD.", field, value)))?;
    if let Some(limit) = not_after {
        if date > limit {
            return Err(invalid(row_id, format!("{}='{}' is in the future.", field, v)));
        }
    }
    Ok(date)
}

pub(crate) fn validate_https(value: &str, field: &str, row_id: &str) -> Result<String> {
    let v = value.trim();
    if !v.starts_with("https://") {
        return Err(invalid(
            row_id,
            format!("{} must start with https:// (got '{}').", field, value),
        ));
    }
    Ok(v.to_string())
}

pub(crate) fn parse_bool(value: &str, field: &str, row_id: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => Err(invalid(
            row_id,
            format!("{} must be TRUE/FALSE (got '{}').", field, value),
        )),
    }
}

/// Shared `status` column rule for programs and program quarters.
pub(crate) fn parse_status(value: &str, row_id: &str) -> Result<String> {
    let status = value.trim().to_lowercase();
    match status.as_str() {
        "verified" | "draft" | "deprecated" | "" => Ok(status),
        _ => Err(invalid(row_id, format!("status='{}' invalid.", status))),
    }
}
