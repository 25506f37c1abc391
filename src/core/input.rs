//! Shared plumbing for the CSV/JSON loaders

use super::warnings::Warning;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

/// One column of a CSV input layout, generated by `#[derive(CsvSchema)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvField {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
}

/// Fatal input problems. Nothing is computed when one of these is raised.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{source_name}: required column '{column}' not found")]
    MissingColumn { source_name: String, column: String },
    #[error("{source_name}: {message}")]
    Malformed {
        source_name: String,
        message: String,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Build a CSV reader whose headers are trimmed and lower-cased, after
/// checking every required column is present.
pub(crate) fn csv_reader<R: Read>(
    reader: R,
    source_name: &str,
    required: &[&str],
) -> Result<csv::Reader<R>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_lowercase())
        .collect();

    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(LoadError::MissingColumn {
                source_name: source_name.to_string(),
                column: column.to_string(),
            });
        }
    }

    rdr.set_headers(headers);
    Ok(rdr)
}

/// Parse a date in any of the layouts found in exported ledgers.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Parse a decimal, accepting plain and scientific notation.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Position of a row inside its input, used to attach warnings.
pub(crate) struct RowContext<'a> {
    pub source: &'a str,
    pub row: usize,
    pub warnings: &'a mut Vec<Warning>,
}

impl RowContext<'_> {
    /// Numeric field where blank means zero and garbage is reported then zeroed.
    pub fn decimal_or_zero(&mut self, field: &str, value: Option<&str>) -> Decimal {
        match value.map(str::trim) {
            None | Some("") => Decimal::ZERO,
            Some(raw) => parse_decimal(raw).unwrap_or_else(|| {
                self.invalid(field, raw);
                Decimal::ZERO
            }),
        }
    }

    pub fn invalid(&mut self, field: &str, value: &str) {
        log::warn!(
            "{}:{}: unreadable {} '{}', using zero",
            self.source,
            self.row,
            field,
            value
        );
        self.warnings.push(Warning::InvalidField {
            source: self.source.to_string(),
            row: self.row,
            field: field.to_string(),
            value: value.to_string(),
        });
    }

    pub fn skip(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("{}:{}: row skipped: {}", self.source, self.row, reason);
        self.warnings.push(Warning::SkippedRow {
            source: self.source.to_string(),
            row: self.row,
            reason,
        });
    }
}

/// Trimmed, non-empty text.
pub(crate) fn text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
