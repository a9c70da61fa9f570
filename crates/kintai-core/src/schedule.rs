//! Schedule service: rule operations against a live store.
//!
//! This is where the pure expander and the retractor meet persistence. Each
//! operation is synchronous from the caller's point of view and reports what
//! it managed to do; a failure part-way through leaves earlier writes in
//! place.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
  attendance::AttendanceRecord,
  dedup::DedupIndex,
  error::ValidationError,
  expand::{ExpansionOutcome, expand},
  retract::{RetractionReport, retract},
  rule::{NewRule, RecurrenceRule, RuleDraft},
  session::Session,
  store::{AttendanceStore, EmployeeDirectory, RecordQuery, RuleStore},
};

#[derive(Debug, Error)]
pub enum ScheduleError<E> {
  #[error("validation error: {0}")]
  Validation(#[from] ValidationError),

  #[error("rule not found: {0}")]
  RuleNotFound(Uuid),

  #[error("store unavailable: {0}")]
  Store(#[source] E),
}

/// What an add or re-sync did.
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionReport {
  pub rule:         RecurrenceRule,
  pub outcome:      ExpansionOutcome,
  /// Records actually written, in date order.
  pub created:      Vec<AttendanceRecord>,
  pub skipped:      usize,
  pub matched_days: usize,
  /// Set when a write failed and the pass stopped early.
  pub aborted:      Option<String>,
}

impl ExpansionReport {
  pub fn created_count(&self) -> usize { self.created.len() }
}

/// Validate `draft`, store the rule, then expand it.
///
/// The rule is persisted before expansion so generated records reference a
/// valid id. The employee's display name is taken from `session` and copied
/// onto the rule and every generated record.
pub async fn add_rule<S>(
  session: &mut Session,
  store: &S,
  draft: RuleDraft,
) -> Result<ExpansionReport, ScheduleError<S::Error>>
where
  S: AttendanceStore + RuleStore + EmployeeDirectory,
{
  let input = prepare_rule(session, store, draft).await?;
  store_and_expand(store, input).await
}

/// The part of [`add_rule`] that needs the session: validation and the
/// employee name lookup. Nothing is written.
pub async fn prepare_rule<S>(
  session: &mut Session,
  store: &S,
  draft: RuleDraft,
) -> Result<NewRule, ScheduleError<S::Error>>
where
  S: EmployeeDirectory,
{
  let mut input = draft.validate()?;

  let name = session
    .employee_name(store, &input.employee_id)
    .await
    .map_err(ScheduleError::Store)?
    .ok_or_else(|| ValidationError::UnknownEmployee(input.employee_id.clone()))?;
  input.employee_name = Some(name);
  Ok(input)
}

/// The part of [`add_rule`] that writes: persist `input`, then expand it.
pub async fn store_and_expand<S>(
  store: &S,
  input: NewRule,
) -> Result<ExpansionReport, ScheduleError<S::Error>>
where
  S: AttendanceStore + RuleStore,
{
  let rule = store.create_rule(input).await.map_err(ScheduleError::Store)?;
  tracing::info!(rule_id = %rule.id, employee = %rule.employee_id, "rule stored");

  expand_into_store(store, rule).await
}

/// Expand an existing rule again, writing only records that are missing.
pub async fn resync_rule<S>(
  store: &S,
  rule_id: Uuid,
) -> Result<ExpansionReport, ScheduleError<S::Error>>
where
  S: AttendanceStore + RuleStore,
{
  let rule = store
    .get_rule(rule_id)
    .await
    .map_err(ScheduleError::Store)?
    .ok_or(ScheduleError::RuleNotFound(rule_id))?;
  expand_into_store(store, rule).await
}

/// Remove the rule itself. Its generated records are not touched; use
/// [`retract_rule`] for that.
pub async fn delete_rule<S>(
  store: &S,
  rule_id: Uuid,
) -> Result<RecurrenceRule, ScheduleError<S::Error>>
where
  S: RuleStore,
{
  let rule = store
    .get_rule(rule_id)
    .await
    .map_err(ScheduleError::Store)?
    .ok_or(ScheduleError::RuleNotFound(rule_id))?;
  store.delete_rule(rule_id).await.map_err(ScheduleError::Store)?;
  tracing::info!(%rule_id, "rule deleted");
  Ok(rule)
}

/// Delete every record generated by `rule_id`. Works whether or not the rule
/// itself still exists.
pub async fn retract_rule<S>(
  store: &S,
  rule_id: Uuid,
) -> Result<RetractionReport, ScheduleError<S::Error>>
where
  S: AttendanceStore,
{
  retract(rule_id, store).await.map_err(ScheduleError::Store)
}

async fn expand_into_store<S>(
  store: &S,
  rule: RecurrenceRule,
) -> Result<ExpansionReport, ScheduleError<S::Error>>
where
  S: AttendanceStore,
{
  if rule.weekdays.is_empty() {
    return Err(ValidationError::NoWeekdays.into());
  }
  let walker = rule.walker()?;

  // Only keys for this employee inside the rule's range can collide.
  let query = RecordQuery::employee_range(rule.employee_id.clone(), walker.start(), walker.end());
  let existing = store.list_records(&query).await.map_err(ScheduleError::Store)?;
  let mut index = DedupIndex::from_records(&existing);

  let expansion = expand(&rule, &mut index)?;

  let mut created = Vec::with_capacity(expansion.records.len());
  let mut aborted = None;
  for input in expansion.records.iter().cloned() {
    let date = input.date;
    match store.create_record(input).await {
      Ok(record) => created.push(record),
      Err(e) => {
        tracing::warn!(rule_id = %rule.id, %date, error = %e, "expansion write failed");
        aborted = Some(e.to_string());
        break;
      }
    }
  }

  let outcome = match expansion.outcome() {
    ExpansionOutcome::Created if created.is_empty() => ExpansionOutcome::Aborted,
    other => other,
  };

  tracing::info!(
    rule_id = %rule.id,
    ?outcome,
    created = created.len(),
    skipped = expansion.skipped,
    "rule expanded"
  );

  Ok(ExpansionReport {
    outcome,
    created,
    skipped: expansion.skipped,
    matched_days: expansion.matched_days,
    aborted,
    rule,
  })
}
