//! Day-by-day iteration over an inclusive date range.

use chrono::{Datelike as _, NaiveDate};

use crate::error::ValidationError;

/// Weekday number of `date`, counting from Sunday = 0.
pub fn weekday_number(date: NaiveDate) -> u8 {
  date.weekday().num_days_from_sunday() as u8
}

/// An inclusive, non-empty range of calendar dates.
///
/// The walker itself holds no iteration state; every call to
/// [`DateWalker::iter`] starts again from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWalker {
  start: NaiveDate,
  end:   NaiveDate,
}

impl DateWalker {
  /// Returns [`ValidationError::InvertedRange`] when `start > end`.
  pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
    if start > end {
      return Err(ValidationError::InvertedRange { start, end });
    }
    Ok(Self { start, end })
  }

  pub fn start(&self) -> NaiveDate { self.start }

  pub fn end(&self) -> NaiveDate { self.end }

  /// Number of days in the range, both ends included.
  pub fn len(&self) -> usize {
    (self.end - self.start).num_days() as usize + 1
  }

  /// Never true; a walker always covers at least one day.
  pub fn is_empty(&self) -> bool { false }

  pub fn iter(&self) -> Days {
    Days { next: Some(self.start), end: self.end }
  }
}

impl IntoIterator for &DateWalker {
  type IntoIter = Days;
  type Item = NaiveDate;

  fn into_iter(self) -> Days { self.iter() }
}

/// Ascending iterator over the days of a [`DateWalker`].
#[derive(Debug, Clone)]
pub struct Days {
  next: Option<NaiveDate>,
  end:  NaiveDate,
}

impl Iterator for Days {
  type Item = NaiveDate;

  fn next(&mut self) -> Option<NaiveDate> {
    let current = self.next?;
    self.next = if current < self.end { current.succ_opt() } else { None };
    Some(current)
  }
}
