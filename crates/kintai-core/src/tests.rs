//! Schedule service and retraction tests against an in-memory store.

use std::{
  collections::HashSet,
  sync::{Mutex, MutexGuard},
};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  attendance::{AttendancePatch, AttendanceRecord, AttendanceType, NewAttendance},
  employee::{Employee, EmployeeId},
  error::ValidationError,
  expand::ExpansionOutcome,
  retract::{find_by_rule, retract},
  rule::{NewRule, RecurrenceRule, RuleDraft},
  schedule::{ScheduleError, add_rule, delete_rule, resync_rule, retract_rule},
  session::Session,
  store::{AttendanceStore, Backend, EmployeeDirectory, RecordQuery, RuleStore},
};

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("memory store: {0}")]
struct MemError(String);

#[derive(Default)]
struct State {
  employees:       Vec<Employee>,
  records:         Vec<AttendanceRecord>,
  rules:           Vec<RecurrenceRule>,
  /// Deletes of these ids fail.
  failing_deletes: HashSet<Uuid>,
  /// Creates fail once this many records exist.
  create_limit:    Option<usize>,
  /// Number of calls that touched the store.
  calls:           usize,
}

#[derive(Default)]
struct MemoryStore {
  state: Mutex<State>,
}

impl MemoryStore {
  fn lock(&self) -> MutexGuard<'_, State> {
    let mut state = self.state.lock().unwrap();
    state.calls += 1;
    state
  }

  fn with_employee(id: &str, name: &str) -> Self {
    let store = Self::default();
    store.state.lock().unwrap().employees.push(Employee {
      id:         id.into(),
      name:       name.into(),
      created_at: Utc::now(),
    });
    store
  }

  fn records(&self) -> Vec<AttendanceRecord> { self.state.lock().unwrap().records.clone() }

  fn calls(&self) -> usize { self.state.lock().unwrap().calls }
}

impl Backend for MemoryStore {
  type Error = MemError;
}

impl AttendanceStore for MemoryStore {
  async fn create_record(&self, input: NewAttendance) -> Result<AttendanceRecord, MemError> {
    let mut state = self.lock();
    if state.create_limit.is_some_and(|limit| state.records.len() >= limit) {
      return Err(MemError("write refused".into()));
    }
    let now = Utc::now();
    let record = AttendanceRecord {
      id:             Uuid::new_v4(),
      employee_id:    input.employee_id,
      employee_name:  input.employee_name,
      date:           input.date,
      start:          input.start,
      hours:          input.hours,
      kind:           input.kind,
      note:           input.note,
      via_rule:       input.via_rule,
      source_rule_id: input.source_rule_id,
      created_at:     now,
      updated_at:     now,
    };
    state.records.push(record.clone());
    Ok(record)
  }

  async fn get_record(&self, id: Uuid) -> Result<Option<AttendanceRecord>, MemError> {
    Ok(self.lock().records.iter().find(|r| r.id == id).cloned())
  }

  async fn update_record(
    &self,
    id: Uuid,
    patch: AttendancePatch,
  ) -> Result<Option<AttendanceRecord>, MemError> {
    let mut state = self.lock();
    let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
      return Ok(None);
    };
    record.apply(patch, Utc::now());
    Ok(Some(record.clone()))
  }

  async fn delete_record(&self, id: Uuid) -> Result<bool, MemError> {
    let mut state = self.lock();
    if state.failing_deletes.contains(&id) {
      return Err(MemError(format!("cannot delete {id}")));
    }
    let before = state.records.len();
    state.records.retain(|r| r.id != id);
    Ok(state.records.len() != before)
  }

  async fn list_records<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> Result<Vec<AttendanceRecord>, MemError> {
    let state = self.lock();
    Ok(
      state
        .records
        .iter()
        .filter(|r| query.matches(r))
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect(),
    )
  }
}

impl RuleStore for MemoryStore {
  async fn create_rule(&self, input: NewRule) -> Result<RecurrenceRule, MemError> {
    let rule = RecurrenceRule {
      id:            Uuid::new_v4(),
      employee_id:   input.employee_id,
      employee_name: input.employee_name,
      weekdays:      input.weekdays,
      start_date:    input.start_date,
      end_date:      input.end_date,
      hours:         input.hours,
      kind:          input.kind,
      note:          input.note,
      created_at:    Utc::now(),
    };
    self.lock().rules.push(rule.clone());
    Ok(rule)
  }

  async fn get_rule(&self, id: Uuid) -> Result<Option<RecurrenceRule>, MemError> {
    Ok(self.lock().rules.iter().find(|r| r.id == id).cloned())
  }

  async fn delete_rule(&self, id: Uuid) -> Result<bool, MemError> {
    let mut state = self.lock();
    let before = state.rules.len();
    state.rules.retain(|r| r.id != id);
    Ok(state.rules.len() != before)
  }

  async fn list_rules(&self) -> Result<Vec<RecurrenceRule>, MemError> {
    Ok(self.lock().rules.clone())
  }
}

impl EmployeeDirectory for MemoryStore {
  async fn add_employee(&self, id: EmployeeId, name: String) -> Result<Employee, MemError> {
    let employee = Employee { id, name, created_at: Utc::now() };
    let mut state = self.lock();
    state.employees.retain(|e| e.id != employee.id);
    state.employees.push(employee.clone());
    Ok(employee)
  }

  async fn get_employee(&self, id: EmployeeId) -> Result<Option<Employee>, MemError> {
    Ok(self.lock().employees.iter().find(|e| e.id == id).cloned())
  }

  async fn list_employees(&self) -> Result<Vec<Employee>, MemError> {
    Ok(self.lock().employees.clone())
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Employee E1, Mondays and Wednesdays, 2024-01-01..=2024-01-10, 8h work.
fn mon_wed_draft() -> RuleDraft {
  RuleDraft {
    employee_id: "E1".into(),
    weekdays:    vec![1, 3],
    start_date:  d(2024, 1, 1),
    end_date:    d(2024, 1, 10),
    hours:       8.0,
    kind:        AttendanceType::Work,
    note:        Some("定例".into()),
  }
}

async fn setup() -> (MemoryStore, Session) {
  let store = MemoryStore::with_employee("E1", "山田");
  let session = Session::load(&store).await.unwrap();
  (store, session)
}

// ─── Expansion through the store ─────────────────────────────────────────────

#[tokio::test]
async fn add_rule_persists_rule_and_records() {
  let (store, mut session) = setup().await;

  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();

  assert_eq!(report.outcome, ExpansionOutcome::Created);
  assert_eq!(report.created_count(), 4);
  assert_eq!(report.skipped, 0);
  assert!(report.aborted.is_none());
  assert_eq!(report.rule.employee_name.as_deref(), Some("山田"));

  let stored = store.records();
  assert_eq!(stored.len(), 4);
  assert!(stored.iter().all(|r| {
    r.via_rule
      && r.source_rule_id == Some(report.rule.id)
      && r.employee_name.as_deref() == Some("山田")
      && r.note.as_deref() == Some("定例")
  }));
  assert!(store.get_rule(report.rule.id).await.unwrap().is_some());
}

#[tokio::test]
async fn resync_is_idempotent() {
  let (store, mut session) = setup().await;
  let first = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();

  let second = resync_rule(&store, first.rule.id).await.unwrap();
  assert_eq!(second.created_count(), 0);
  assert_eq!(second.skipped, 4);
  assert_eq!(second.outcome, ExpansionOutcome::AllDuplicates);
  assert_eq!(store.records().len(), 4);
}

#[tokio::test]
async fn second_identical_rule_creates_nothing() {
  let (store, mut session) = setup().await;
  add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();

  let again = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();
  assert_eq!(again.created_count(), 0);
  assert_eq!(again.skipped, 4);
  assert_eq!(store.records().len(), 4);
}

#[tokio::test]
async fn resync_fills_in_manually_deleted_days() {
  let (store, mut session) = setup().await;
  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();
  store.delete_record(report.created[1].id).await.unwrap();

  let resync = resync_rule(&store, report.rule.id).await.unwrap();
  assert_eq!(resync.created_count(), 1);
  assert_eq!(resync.created[0].date, d(2024, 1, 3));
  assert_eq!(resync.skipped, 3);
}

#[tokio::test]
async fn manual_entry_with_same_key_is_skipped() {
  let (store, mut session) = setup().await;
  store
    .create_record(NewAttendance::manual("E1".into(), d(2024, 1, 8), AttendanceType::Work, 6.0))
    .await
    .unwrap();

  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();
  assert_eq!(report.created_count(), 3);
  assert_eq!(report.skipped, 1);
  assert!(report.created.iter().all(|r| r.date != d(2024, 1, 8)));
}

#[tokio::test]
async fn closed_rule_ignores_hours() {
  let (store, mut session) = setup().await;
  let mut draft = mon_wed_draft();
  draft.kind = AttendanceType::Closed;
  draft.hours = 5.0;

  let report = add_rule(&mut session, &store, draft).await.unwrap();
  assert_eq!(report.rule.hours, 0.0);
  assert!(store.records().iter().all(|r| r.hours == 0.0));
}

#[tokio::test]
async fn inverted_range_fails_before_store_access() {
  let (store, mut session) = setup().await;
  let calls_before = store.calls();
  let mut draft = mon_wed_draft();
  draft.start_date = d(2024, 2, 10);
  draft.end_date = d(2024, 2, 1);

  let err = add_rule(&mut session, &store, draft).await.unwrap_err();
  assert!(matches!(
    err,
    ScheduleError::Validation(ValidationError::InvertedRange { .. })
  ));
  assert_eq!(store.calls(), calls_before);
  assert!(store.records().is_empty());
}

#[tokio::test]
async fn unknown_employee_is_rejected_without_writes() {
  let (store, mut session) = setup().await;
  let mut draft = mon_wed_draft();
  draft.employee_id = "E404".into();

  let err = add_rule(&mut session, &store, draft).await.unwrap_err();
  assert!(matches!(
    err,
    ScheduleError::Validation(ValidationError::UnknownEmployee(id)) if id.as_str() == "E404"
  ));
  assert!(store.list_rules().await.unwrap().is_empty());
}

#[tokio::test]
async fn session_picks_up_employees_added_later() {
  let (store, mut session) = setup().await;
  store.add_employee("E2".into(), "佐藤".into()).await.unwrap();

  let mut draft = mon_wed_draft();
  draft.employee_id = "E2".into();
  let report = add_rule(&mut session, &store, draft).await.unwrap();
  assert_eq!(report.rule.employee_name.as_deref(), Some("佐藤"));
  assert_eq!(session.cached_name(&"E2".into()), Some("佐藤"));
}

#[tokio::test]
async fn rule_without_matching_days_reports_nothing_to_expand() {
  let (store, mut session) = setup().await;
  let mut draft = mon_wed_draft();
  draft.weekdays = vec![0];
  draft.start_date = d(2024, 1, 2);
  draft.end_date = d(2024, 1, 4);

  let report = add_rule(&mut session, &store, draft).await.unwrap();
  assert_eq!(report.outcome, ExpansionOutcome::NothingToExpand);
  assert_eq!(report.matched_days, 0);
}

#[tokio::test]
async fn failed_write_keeps_earlier_records() {
  let (store, mut session) = setup().await;
  store.state.lock().unwrap().create_limit = Some(2);

  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();
  assert_eq!(report.created_count(), 2);
  assert_eq!(report.outcome, ExpansionOutcome::Created);
  assert!(report.aborted.is_some());
  assert_eq!(store.records().len(), 2);

  store.state.lock().unwrap().create_limit = None;
  let resync = resync_rule(&store, report.rule.id).await.unwrap();
  assert_eq!(resync.created_count(), 2);
  assert_eq!(resync.skipped, 2);
}

#[tokio::test]
async fn refused_first_write_reports_aborted() {
  let (store, mut session) = setup().await;
  store.state.lock().unwrap().create_limit = Some(0);

  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();
  assert_eq!(report.outcome, ExpansionOutcome::Aborted);
  assert_eq!(report.created_count(), 0);
  assert_eq!(report.matched_days, 4);
  assert_eq!(report.aborted.as_deref(), Some("memory store: write refused"));
  assert!(store.records().is_empty());

  // The rule survives, so a re-sync can still fill it in.
  store.state.lock().unwrap().create_limit = None;
  let resync = resync_rule(&store, report.rule.id).await.unwrap();
  assert_eq!(resync.outcome, ExpansionOutcome::Created);
  assert_eq!(resync.created_count(), 4);
}

#[tokio::test]
async fn resync_of_missing_rule_is_not_found() {
  let (store, _) = setup().await;
  let id = Uuid::new_v4();
  let err = resync_rule(&store, id).await.unwrap_err();
  assert!(matches!(err, ScheduleError::RuleNotFound(missing) if missing == id));
}

// ─── Retraction ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn retract_removes_every_generated_record() {
  let (store, mut session) = setup().await;
  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();

  let retraction = retract(report.rule.id, &store).await.unwrap();
  assert_eq!(retraction.matched, 4);
  assert_eq!(retraction.deleted_count(), 4);
  assert!(retraction.is_complete());
  assert!(find_by_rule(report.rule.id, &store.records()).is_empty());

  let again = retract(report.rule.id, &store).await.unwrap();
  assert_eq!(again.matched, 0);
  assert!(again.is_complete());
}

#[tokio::test]
async fn retract_leaves_other_records_alone() {
  let (store, mut session) = setup().await;
  let target = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();

  let mut other = mon_wed_draft();
  other.kind = AttendanceType::Remote;
  let kept = add_rule(&mut session, &store, other).await.unwrap();
  store
    .create_record(NewAttendance::manual("E1".into(), d(2024, 1, 2), AttendanceType::Paid, 8.0))
    .await
    .unwrap();

  retract_rule(&store, target.rule.id).await.unwrap();

  let remaining = store.records();
  assert_eq!(remaining.len(), 5);
  assert!(remaining.iter().all(|r| r.source_rule_id != Some(target.rule.id)));
  assert_eq!(find_by_rule(kept.rule.id, &remaining).len(), 4);
}

#[tokio::test]
async fn retract_reports_partial_failure() {
  let (store, mut session) = setup().await;
  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();
  let stuck = report.created[2].id;
  store.state.lock().unwrap().failing_deletes.insert(stuck);

  let retraction = retract(report.rule.id, &store).await.unwrap();
  assert_eq!(retraction.matched, 4);
  assert_eq!(retraction.deleted_count(), 3);
  assert!(!retraction.is_complete());
  assert_eq!(retraction.failed.len(), 1);
  assert_eq!(retraction.failed[0].id, stuck);

  let records = store.records();
  let left = find_by_rule(report.rule.id, &records);
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].id, stuck);
}

#[tokio::test]
async fn deleting_rule_does_not_cascade() {
  let (store, mut session) = setup().await;
  let report = add_rule(&mut session, &store, mon_wed_draft()).await.unwrap();

  let deleted = delete_rule(&store, report.rule.id).await.unwrap();
  assert_eq!(deleted.id, report.rule.id);
  assert!(store.get_rule(report.rule.id).await.unwrap().is_none());
  assert_eq!(store.records().len(), 4);

  // Records stay traceable after the rule is gone.
  let retraction = retract_rule(&store, report.rule.id).await.unwrap();
  assert_eq!(retraction.deleted_count(), 4);
}
