use super::input::parse_date;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("period start {start} is after period end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

/// Reporting period, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Inverted { start, end });
        }
        Ok(Period { start, end })
    }

    /// Build from command-line text.
    pub fn parse(start: &str, end: &str) -> Result<Self, PeriodError> {
        let start = parse_date(start).ok_or_else(|| PeriodError::InvalidDate(start.to_string()))?;
        let end = parse_date(end).ok_or_else(|| PeriodError::InvalidDate(end.to_string()))?;
        Period::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_before(&self, date: NaiveDate) -> bool {
        date < self.start
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%d/%m/%Y"),
            self.end.format("%d/%m/%Y")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn bounds_are_inclusive() {
        let period = Period::new(date("2024-01-01"), date("2024-01-31")).unwrap();
        assert!(period.contains(date("2024-01-01")));
        assert!(period.contains(date("2024-01-31")));
        assert!(!period.contains(date("2024-02-01")));
        assert!(period.is_before(date("2023-12-31")));
        assert!(!period.is_before(date("2024-01-01")));
    }

    #[test]
    fn inverted_period_is_rejected() {
        let err = Period::parse("2024-02-01", "2024-01-01").unwrap_err();
        assert_eq!(
            err,
            PeriodError::Inverted {
                start: date("2024-02-01"),
                end: date("2024-01-01"),
            }
        );
    }

    #[test]
    fn accepts_day_first_dates() {
        let period = Period::parse("01/01/2024", "31/03/2024").unwrap();
        assert_eq!(period.end(), date("2024-03-31"));
        assert_eq!(period.to_string(), "01/01/2024 to 31/03/2024");
    }
}
