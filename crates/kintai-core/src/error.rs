//! Error types for `kintai-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::employee::EmployeeId;

/// Input rejected before any store mutation takes place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("employee is required")]
  MissingEmployee,

  #[error("unknown employee: {0}")]
  UnknownEmployee(EmployeeId),

  #[error("at least one weekday must be selected")]
  NoWeekdays,

  #[error("weekday number out of range (expected 0..=6): {0}")]
  InvalidWeekday(u8),

  #[error("start date {start} is after end date {end}")]
  InvertedRange { start: NaiveDate, end: NaiveDate },

  #[error("hours must be a non-negative number, got {0}")]
  NegativeHours(f64),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("unknown attendance type: {0:?}")]
  UnknownAttendanceType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
