//! Storage traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `kintai-store-sqlite`). The expander, retractor and HTTP layer depend on
//! these abstractions, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  attendance::{AttendancePatch, AttendanceRecord, AttendanceType, NewAttendance},
  employee::{Employee, EmployeeId},
  rule::{NewRule, RecurrenceRule},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`AttendanceStore::list_records`]. Every set field narrows
/// the result; an empty query lists everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
  pub employee_id:    Option<EmployeeId>,
  /// Inclusive lower bound on `date`.
  pub from:           Option<NaiveDate>,
  /// Inclusive upper bound on `date`.
  pub to:             Option<NaiveDate>,
  pub kind:           Option<AttendanceType>,
  pub source_rule_id: Option<Uuid>,
  pub via_rule:       Option<bool>,
  pub limit:          Option<usize>,
  pub offset:         Option<usize>,
}

impl RecordQuery {
  /// Every record generated by `rule_id`.
  pub fn by_rule(rule_id: Uuid) -> Self {
    Self { source_rule_id: Some(rule_id), ..Default::default() }
  }

  /// Every record of `employee_id` dated within `from..=to`.
  pub fn employee_range(employee_id: EmployeeId, from: NaiveDate, to: NaiveDate) -> Self {
    Self {
      employee_id: Some(employee_id),
      from: Some(from),
      to: Some(to),
      ..Default::default()
    }
  }

  /// Whether `record` passes the filters (pagination is not considered).
  pub fn matches(&self, record: &AttendanceRecord) -> bool {
    self.employee_id.as_ref().is_none_or(|e| *e == record.employee_id)
      && self.from.is_none_or(|d| record.date >= d)
      && self.to.is_none_or(|d| record.date <= d)
      && self.kind.is_none_or(|k| k == record.kind)
      && self
        .source_rule_id
        .is_none_or(|id| record.source_rule_id == Some(id))
      && self.via_rule.is_none_or(|v| v == record.via_rule)
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error type of a storage backend.
///
/// All trait methods below return `Send` futures so backends can be used from
/// a multi-threaded runtime (e.g. tokio with `axum`).
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Keyed storage of [`AttendanceRecord`]s.
pub trait AttendanceStore: Backend {
  /// Persist a new record. `id` and timestamps are assigned by the store.
  fn create_record(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Apply `patch` and return the updated record, or `None` if not found.
  fn update_record(
    &self,
    id: Uuid,
    patch: AttendancePatch,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Delete a record. Returns `false` if it did not exist.
  fn delete_record(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// List records matching `query`, ordered by date then creation time.
  fn list_records<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + 'a;
}

/// Keyed storage of [`RecurrenceRule`]s. Rules are never updated.
pub trait RuleStore: Backend {
  fn create_rule(
    &self,
    input: NewRule,
  ) -> impl Future<Output = Result<RecurrenceRule, Self::Error>> + Send + '_;

  fn get_rule(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RecurrenceRule>, Self::Error>> + Send + '_;

  /// Delete the rule only; records it generated are left untouched.
  fn delete_rule(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// All rules, newest first.
  fn list_rules(
    &self,
  ) -> impl Future<Output = Result<Vec<RecurrenceRule>, Self::Error>> + Send + '_;
}

/// Lookup of employee display names.
pub trait EmployeeDirectory: Backend {
  /// Insert or rename an employee.
  fn add_employee(
    &self,
    id: EmployeeId,
    name: String,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: EmployeeId,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn list_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;
}
