//! Recurrence rules: "employee X, these weekdays, between these dates".
//!
//! A rule is immutable once stored. It owns none of the records it expands
//! into; those point back at it through `source_rule_id`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  attendance::{AttendanceType, check_hours},
  employee::EmployeeId,
  error::ValidationError,
  walker::{DateWalker, weekday_number},
};

// ─── WeekdaySet ──────────────────────────────────────────────────────────────

const WEEKDAY_LABELS: [&str; 7] = ["日", "月", "火", "水", "木", "金", "土"];

/// A set of weekday numbers, 0 = Sunday through 6 = Saturday.
///
/// Serialised as a sorted array of numbers, e.g. `[1, 3]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
  pub fn from_numbers(
    numbers: impl IntoIterator<Item = u8>,
  ) -> Result<Self, ValidationError> {
    let mut bits = 0u8;
    for n in numbers {
      if n > 6 {
        return Err(ValidationError::InvalidWeekday(n));
      }
      bits |= 1 << n;
    }
    Ok(Self(bits))
  }

  pub fn contains(&self, weekday: u8) -> bool {
    weekday <= 6 && self.0 & (1 << weekday) != 0
  }

  pub fn contains_date(&self, date: NaiveDate) -> bool {
    self.contains(weekday_number(date))
  }

  pub fn is_empty(&self) -> bool { self.0 == 0 }

  pub fn len(&self) -> usize { self.0.count_ones() as usize }

  /// Member weekday numbers in ascending order.
  pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
    (0..7u8).filter(|n| self.contains(*n))
  }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
  type Error = ValidationError;

  fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
    Self::from_numbers(numbers)
  }
}

impl From<WeekdaySet> for Vec<u8> {
  fn from(set: WeekdaySet) -> Self { set.iter().collect() }
}

impl fmt::Display for WeekdaySet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for n in self.iter() {
      f.write_str(WEEKDAY_LABELS[n as usize])?;
    }
    Ok(())
  }
}

// ─── RecurrenceRule ──────────────────────────────────────────────────────────

/// A persisted weekly recurrence rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
  pub id:            Uuid,
  pub employee_id:   EmployeeId,
  pub employee_name: Option<String>,
  pub weekdays:      WeekdaySet,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  pub hours:         f64,
  #[serde(rename = "type")]
  pub kind:          AttendanceType,
  pub note:          Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl RecurrenceRule {
  /// The range this rule covers. Fails if the stored range is inverted.
  pub fn walker(&self) -> Result<DateWalker, ValidationError> {
    DateWalker::new(self.start_date, self.end_date)
  }
}

// ─── NewRule ─────────────────────────────────────────────────────────────────

/// A validated rule ready to be persisted through
/// [`crate::store::RuleStore::create_rule`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
  pub employee_id:   EmployeeId,
  pub employee_name: Option<String>,
  pub weekdays:      WeekdaySet,
  pub start_date:    NaiveDate,
  pub end_date:      NaiveDate,
  pub hours:         f64,
  pub kind:          AttendanceType,
  pub note:          Option<String>,
}

// ─── RuleDraft ───────────────────────────────────────────────────────────────

/// Rule input as submitted by a client, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleDraft {
  #[serde(default)]
  pub employee_id: EmployeeId,
  #[serde(default)]
  pub weekdays:    Vec<u8>,
  pub start_date:  NaiveDate,
  pub end_date:    NaiveDate,
  #[serde(default)]
  pub hours:       f64,
  #[serde(rename = "type")]
  pub kind:        AttendanceType,
  pub note:        Option<String>,
}

impl RuleDraft {
  /// Check everything that can be checked without a store. Directory lookups
  /// (unknown employee) happen in the schedule service.
  pub fn validate(self) -> Result<NewRule, ValidationError> {
    if self.employee_id.is_blank() {
      return Err(ValidationError::MissingEmployee);
    }
    let weekdays = WeekdaySet::from_numbers(self.weekdays)?;
    if weekdays.is_empty() {
      return Err(ValidationError::NoWeekdays);
    }
    DateWalker::new(self.start_date, self.end_date)?;
    let hours = check_hours(self.hours)?;

    Ok(NewRule {
      employee_id: self.employee_id,
      employee_name: None,
      weekdays,
      start_date: self.start_date,
      end_date: self.end_date,
      hours: self.kind.normalize_hours(hours),
      kind: self.kind,
      note: self.note.filter(|n| !n.trim().is_empty()),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn draft() -> RuleDraft {
    RuleDraft {
      employee_id: "E1".into(),
      weekdays:    vec![1, 3],
      start_date:  d(2024, 1, 1),
      end_date:    d(2024, 1, 10),
      hours:       8.0,
      kind:        AttendanceType::Work,
      note:        None,
    }
  }

  #[test]
  fn weekday_set_serialises_sorted() {
    let set = WeekdaySet::from_numbers([3, 1, 3]).unwrap();
    assert_eq!(serde_json::to_string(&set).unwrap(), "[1,3]");
    assert_eq!(set.len(), 2);
    assert_eq!(set.to_string(), "月水");
  }

  #[test]
  fn weekday_set_rejects_out_of_range() {
    assert!(serde_json::from_str::<WeekdaySet>("[1,7]").is_err());
    assert_eq!(
      WeekdaySet::from_numbers([9]).unwrap_err(),
      ValidationError::InvalidWeekday(9)
    );
  }

  #[test]
  fn valid_draft_passes() {
    let rule = draft().validate().unwrap();
    assert!(rule.weekdays.contains(1));
    assert!(rule.weekdays.contains(3));
    assert!(!rule.weekdays.contains(0));
    assert_eq!(rule.hours, 8.0);
  }

  #[test]
  fn blank_employee_is_rejected() {
    let mut input = draft();
    input.employee_id = EmployeeId::new("  ");
    assert_eq!(input.validate().unwrap_err(), ValidationError::MissingEmployee);
  }

  #[test]
  fn empty_weekdays_are_rejected() {
    let mut input = draft();
    input.weekdays.clear();
    assert_eq!(input.validate().unwrap_err(), ValidationError::NoWeekdays);
  }

  #[test]
  fn inverted_range_is_rejected() {
    let mut input = draft();
    input.start_date = d(2024, 2, 10);
    input.end_date = d(2024, 2, 1);
    assert!(matches!(
      input.validate().unwrap_err(),
      ValidationError::InvertedRange { .. }
    ));
  }

  #[test]
  fn closed_rule_drops_hours() {
    let mut input = draft();
    input.kind = AttendanceType::Closed;
    input.hours = 5.0;
    assert_eq!(input.validate().unwrap().hours, 0.0);
  }

  #[test]
  fn draft_deserialises_with_missing_employee() {
    let json = r#"{
      "weekdays": [1],
      "start_date": "2024-01-01",
      "end_date": "2024-01-31",
      "type": "remote"
    }"#;
    let input: RuleDraft = serde_json::from_str(json).unwrap();
    assert_eq!(input.validate().unwrap_err(), ValidationError::MissingEmployee);
  }
}
