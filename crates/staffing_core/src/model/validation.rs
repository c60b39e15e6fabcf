//! Field-level validation rules shared by all entity kinds.
//!
//! # Invariants
//! - Write paths call `validate()` before touching storage.
//! - Read paths re-validate rows so corrupt data is reported, not masked.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static DATE_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));

/// Canonical date text layout used for project dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Years that render as exactly four digits in `DATE_FORMAT`.
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Field-rule violations for entity records.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Salary is negative or not a finite number.
    InvalidSalary(f64),
    /// Project end date is not strictly after its start date.
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },
    /// Text field length in characters is outside `min..=max`.
    TextLength {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },
    /// Date year is outside 1..=9999.
    DateOutOfRange(NaiveDate),
    /// New project date lies before the current day.
    DateInPast { date: NaiveDate, today: NaiveDate },
    /// Date text does not match `YYYY-MM-DD` or is not a calendar date.
    InvalidDate(String),
    /// Project input did not name an owning employer.
    MissingEmployer,
    /// Project update tried to move the project to another employer.
    EmployerImmutable,
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::InvalidSalary(value) => {
                write!(f, "salary must be a non-negative number, got {value}")
            }
            Self::EndNotAfterStart { start, end } => {
                write!(f, "end date {end} must be after start date {start}")
            }
            Self::TextLength {
                field,
                min,
                max,
                actual,
            } => write!(
                f,
                "field `{field}` must be {min}..={max} characters long, got {actual}"
            ),
            Self::DateOutOfRange(date) => {
                write!(f, "date {date} is outside years 0001..=9999")
            }
            Self::DateInPast { date, today } => {
                write!(f, "date {date} is before today ({today})")
            }
            Self::InvalidDate(value) => {
                write!(f, "invalid date `{value}`; expected YYYY-MM-DD")
            }
            Self::MissingEmployer => write!(f, "project requires an owning employer"),
            Self::EmployerImmutable => write!(f, "project employer cannot be changed"),
        }
    }
}

impl Error for EntityValidationError {}

/// Parses project date text in strict `YYYY-MM-DD` form.
pub fn parse_project_date(value: &str) -> Result<NaiveDate, EntityValidationError> {
    let trimmed = value.trim();
    if !DATE_TEXT_RE.is_match(trimmed) {
        return Err(EntityValidationError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| EntityValidationError::InvalidDate(value.to_string()))
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), EntityValidationError> {
    if value.trim().is_empty() {
        return Err(EntityValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), EntityValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(EntityValidationError::TextLength {
            field,
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Rejects dates whose text form would not sort chronologically.
pub(crate) fn require_storable_date(date: NaiveDate) -> Result<(), EntityValidationError> {
    if !STORABLE_YEARS.contains(&date.year()) {
        return Err(EntityValidationError::DateOutOfRange(date));
    }
    Ok(())
}
