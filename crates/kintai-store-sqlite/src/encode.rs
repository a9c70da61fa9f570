//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`, so lexical order matches chronological order. Weekday sets
//! are compact JSON arrays. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use kintai_core::{
  attendance::{AttendanceRecord, AttendanceType},
  employee::{Employee, EmployeeId},
  rule::{RecurrenceRule, WeekdaySet},
};
use uuid::Uuid;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── AttendanceType ───────────────────────────────────────────────────────────

pub fn encode_kind(k: AttendanceType) -> &'static str { k.as_str() }

pub fn decode_kind(s: &str) -> Result<AttendanceType> { Ok(s.parse()?) }

// ─── WeekdaySet ───────────────────────────────────────────────────────────────

pub fn encode_weekdays(w: WeekdaySet) -> Result<String> {
  Ok(serde_json::to_string(&w)?)
}

pub fn decode_weekdays(s: &str) -> Result<WeekdaySet> {
  let numbers: Vec<u8> = serde_json::from_str(s)?;
  Ok(WeekdaySet::from_numbers(numbers)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawRecord::from_row`].
pub const RECORD_COLUMNS: &str = "record_id, employee_id, employee_name, date, start, hours, \
                                  kind, note, via_rule, source_rule_id, created_at, updated_at";

/// Raw values read directly from a `records` row.
pub struct RawRecord {
  pub record_id:      String,
  pub employee_id:    String,
  pub employee_name:  Option<String>,
  pub date:           String,
  pub start:          Option<String>,
  pub hours:          f64,
  pub kind:           String,
  pub note:           Option<String>,
  pub via_rule:       bool,
  pub source_rule_id: Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:      row.get(0)?,
      employee_id:    row.get(1)?,
      employee_name:  row.get(2)?,
      date:           row.get(3)?,
      start:          row.get(4)?,
      hours:          row.get(5)?,
      kind:           row.get(6)?,
      note:           row.get(7)?,
      via_rule:       row.get(8)?,
      source_rule_id: row.get(9)?,
      created_at:     row.get(10)?,
      updated_at:     row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      id:             decode_uuid(&self.record_id)?,
      employee_id:    EmployeeId(self.employee_id),
      employee_name:  self.employee_name,
      date:           decode_date(&self.date)?,
      start:          self.start,
      hours:          self.hours,
      kind:           decode_kind(&self.kind)?,
      note:           self.note,
      via_rule:       self.via_rule,
      source_rule_id: self.source_rule_id.as_deref().map(decode_uuid).transpose()?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawRule::from_row`].
pub const RULE_COLUMNS: &str = "rule_id, employee_id, employee_name, weekdays, start_date, \
                                end_date, hours, kind, note, created_at";

/// Raw values read directly from a `rules` row.
pub struct RawRule {
  pub rule_id:       String,
  pub employee_id:   String,
  pub employee_name: Option<String>,
  pub weekdays:      String,
  pub start_date:    String,
  pub end_date:      String,
  pub hours:         f64,
  pub kind:          String,
  pub note:          Option<String>,
  pub created_at:    String,
}

impl RawRule {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rule_id:       row.get(0)?,
      employee_id:   row.get(1)?,
      employee_name: row.get(2)?,
      weekdays:      row.get(3)?,
      start_date:    row.get(4)?,
      end_date:      row.get(5)?,
      hours:         row.get(6)?,
      kind:          row.get(7)?,
      note:          row.get(8)?,
      created_at:    row.get(9)?,
    })
  }

  pub fn into_rule(self) -> Result<RecurrenceRule> {
    Ok(RecurrenceRule {
      id:            decode_uuid(&self.rule_id)?,
      employee_id:   EmployeeId(self.employee_id),
      employee_name: self.employee_name,
      weekdays:      decode_weekdays(&self.weekdays)?,
      start_date:    decode_date(&self.start_date)?,
      end_date:      decode_date(&self.end_date)?,
      hours:         self.hours,
      kind:          decode_kind(&self.kind)?,
      note:          self.note,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id: String,
  pub name:        String,
  pub created_at:  String,
}

impl RawEmployee {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id: row.get(0)?,
      name:        row.get(1)?,
      created_at:  row.get(2)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      id:         EmployeeId(self.employee_id),
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_lexically() {
    let a = encode_date(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
    let b = encode_date(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
    assert_eq!(a, "2024-01-09");
    assert!(a < b);
    assert_eq!(decode_date(&b).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
  }

  #[test]
  fn weekdays_reject_bad_numbers() {
    assert!(decode_weekdays("[1,3]").is_ok());
    assert!(matches!(decode_weekdays("[8]"), Err(Error::Weekdays(_))));
  }

  #[test]
  fn unknown_kind_is_a_core_error() {
    assert!(matches!(decode_kind("nap"), Err(Error::Core(_))));
  }
}
