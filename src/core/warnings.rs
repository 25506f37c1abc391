use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data-quality findings collected while loading and computing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Input row could not be used and was left out.
    SkippedRow {
        source: String,
        row: usize,
        reason: String,
    },
    /// Optional numeric field was unreadable and counted as zero.
    InvalidField {
        source: String,
        row: usize,
        field: String,
        value: String,
    },
    /// Account code listed more than once; the later entry replaced the earlier one.
    DuplicateAccount { code: String },
    /// Account code shorter than three characters.
    NonStandardAccountCode { code: String },
    /// Transactions referenced an account missing from the chart,
    /// so a placeholder account was created.
    UnknownAccount { code: String },
    /// On-hand stock did not cover the issue.
    /// When `available = 0` there was nothing to cost the issue against.
    InsufficientStock {
        #[schemars(with = "f64")]
        available: Decimal,
        #[schemars(with = "f64")]
        required: Decimal,
    },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::SkippedRow { .. } => "SkippedRow",
            Warning::InvalidField { .. } => "InvalidField",
            Warning::DuplicateAccount { .. } => "DuplicateAccount",
            Warning::NonStandardAccountCode { .. } => "NonStandardAccountCode",
            Warning::UnknownAccount { .. } => "UnknownAccount",
            Warning::InsufficientStock { available, .. } if available.is_zero() => "NoStock",
            Warning::InsufficientStock { .. } => "InsufficientStock",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SkippedRow {
                source,
                row,
                reason,
            } => write!(f, "{}:{} skipped: {}", source, row, reason),
            Warning::InvalidField {
                source,
                row,
                field,
                value,
            } => write!(
                f,
                "{}:{} unreadable {} '{}' counted as zero",
                source, row, field, value
            ),
            Warning::DuplicateAccount { code } => {
                write!(f, "account {} listed more than once, last entry kept", code)
            }
            Warning::NonStandardAccountCode { code } => {
                write!(f, "account code '{}' is shorter than 3 characters", code)
            }
            Warning::UnknownAccount { code } => {
                write!(f, "account {} is not in the chart, placeholder created", code)
            }
            Warning::InsufficientStock {
                available,
                required,
            } => write!(
                f,
                "only {} on hand for an issue of {}, issue is under-costed",
                available.normalize(),
                required.normalize()
            ),
        }
    }
}
