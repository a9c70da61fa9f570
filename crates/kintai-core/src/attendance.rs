//! Attendance records: one entry per employee, date and type.
//!
//! Records are created either manually or by expanding a
//! [`RecurrenceRule`](crate::rule::RecurrenceRule). Generated records carry the
//! id of their rule in `source_rule_id`; that id is a plain lookup key, never
//! an owning link.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, employee::EmployeeId, error::ValidationError};

// ─── AttendanceType ──────────────────────────────────────────────────────────

/// The kind of day being logged.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  IntoStaticStr,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceType {
  Work,
  Off,
  Remote,
  /// The office is closed; always recorded with zero hours.
  Closed,
  Paid,
  Overtime,
  Special,
  Holiday,
}

impl AttendanceType {
  /// Discriminant stored in the database and used in dedup keys.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Human-readable label shown in lists and notifications.
  pub fn label(self) -> &'static str {
    match self {
      Self::Work => "出勤",
      Self::Off => "休み",
      Self::Remote => "在宅",
      Self::Closed => "休業",
      Self::Paid => "有給",
      Self::Overtime => "残業",
      Self::Special => "特別休暇",
      Self::Holiday => "休日出勤",
    }
  }

  /// Closed days never carry hours, whatever the input says.
  pub fn normalize_hours(self, hours: f64) -> f64 {
    match self {
      Self::Closed => 0.0,
      _ => hours,
    }
  }
}

impl FromStr for AttendanceType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "work" => Ok(Self::Work),
      "off" => Ok(Self::Off),
      "remote" => Ok(Self::Remote),
      "closed" => Ok(Self::Closed),
      "paid" => Ok(Self::Paid),
      "overtime" => Ok(Self::Overtime),
      "special" => Ok(Self::Special),
      "holiday" => Ok(Self::Holiday),
      other => Err(Error::UnknownAttendanceType(other.to_owned())),
    }
  }
}

/// Reject negative or non-finite hour values.
pub fn check_hours(hours: f64) -> Result<f64, ValidationError> {
  if hours.is_finite() && hours >= 0.0 {
    Ok(hours)
  } else {
    Err(ValidationError::NegativeHours(hours))
  }
}

// ─── AttendanceRecord ────────────────────────────────────────────────────────

/// A persisted attendance entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub id:             Uuid,
  pub employee_id:    EmployeeId,
  /// Display name captured when the record was created.
  pub employee_name:  Option<String>,
  pub date:           NaiveDate,
  /// Optional start time of day, e.g. `"09:00"`.
  pub start:          Option<String>,
  pub hours:          f64,
  #[serde(rename = "type")]
  pub kind:           AttendanceType,
  pub note:           Option<String>,
  pub via_rule:       bool,
  pub source_rule_id: Option<Uuid>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

impl AttendanceRecord {
  /// Apply a partial update in place. Hours are re-normalised afterwards so a
  /// record switched to `closed` drops its hours.
  pub fn apply(&mut self, patch: AttendancePatch, now: DateTime<Utc>) {
    if let Some(date) = patch.date {
      self.date = date;
    }
    if let Some(start) = patch.start {
      self.start = Some(start);
    }
    if let Some(hours) = patch.hours {
      self.hours = hours;
    }
    if let Some(kind) = patch.kind {
      self.kind = kind;
    }
    if let Some(note) = patch.note {
      self.note = Some(note);
    }
    self.hours = self.kind.normalize_hours(self.hours);
    self.updated_at = now;
  }
}

// ─── NewAttendance ───────────────────────────────────────────────────────────

/// Input to [`crate::store::AttendanceStore::create_record`].
/// `id`, `created_at` and `updated_at` are always set by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttendance {
  pub employee_id:    EmployeeId,
  pub employee_name:  Option<String>,
  pub date:           NaiveDate,
  pub start:          Option<String>,
  pub hours:          f64,
  #[serde(rename = "type")]
  pub kind:           AttendanceType,
  pub note:           Option<String>,
  pub via_rule:       bool,
  pub source_rule_id: Option<Uuid>,
}

impl NewAttendance {
  /// A manual entry with hours normalised for `kind`.
  pub fn manual(
    employee_id: EmployeeId,
    date: NaiveDate,
    kind: AttendanceType,
    hours: f64,
  ) -> Self {
    Self {
      employee_id,
      employee_name: None,
      date,
      start: None,
      hours: kind.normalize_hours(hours),
      kind,
      note: None,
      via_rule: false,
      source_rule_id: None,
    }
  }
}

// ─── AttendancePatch ─────────────────────────────────────────────────────────

/// Partial update for an existing record. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendancePatch {
  pub date:  Option<NaiveDate>,
  pub start: Option<String>,
  pub hours: Option<f64>,
  #[serde(rename = "type")]
  pub kind:  Option<AttendanceType>,
  pub note:  Option<String>,
}
