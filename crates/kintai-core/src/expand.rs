//! Rule expansion: recurrence rule → concrete attendance records.
//!
//! Expansion is pure. It reads a [`DedupIndex`] snapshot, proposes one record
//! per matching day and never touches a store. Persisting the output is the
//! job of [`crate::schedule`].

use serde::Serialize;

use crate::{
  attendance::NewAttendance,
  dedup::{DedupIndex, DedupKey},
  error::ValidationError,
  rule::RecurrenceRule,
};

/// How an expansion pass ended, for reporting back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionOutcome {
  /// No day in the range falls on one of the rule's weekdays.
  NothingToExpand,
  /// Days matched, but every one of them already had a record.
  AllDuplicates,
  /// At least one new record was proposed (or, after persisting, written).
  Created,
  /// Records were due but the store accepted none of them. Only reported
  /// after persisting; [`Expansion::outcome`] never returns it.
  Aborted,
}

/// Result of [`expand`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expansion {
  /// New records, in ascending date order.
  pub records:      Vec<NewAttendance>,
  /// Matching days skipped because their key already existed.
  pub skipped:      usize,
  /// Days in the range whose weekday is in the rule.
  pub matched_days: usize,
}

impl Expansion {
  pub fn outcome(&self) -> ExpansionOutcome {
    if self.matched_days == 0 {
      ExpansionOutcome::NothingToExpand
    } else if self.records.is_empty() {
      ExpansionOutcome::AllDuplicates
    } else {
      ExpansionOutcome::Created
    }
  }
}

/// Expand `rule` against `index`.
///
/// Every proposed record's key is inserted into `index` before the next day is
/// evaluated, so the output never holds two records with the same key and a
/// second call with the same index proposes nothing.
pub fn expand(
  rule: &RecurrenceRule,
  index: &mut DedupIndex,
) -> Result<Expansion, ValidationError> {
  if rule.weekdays.is_empty() {
    return Err(ValidationError::NoWeekdays);
  }
  let walker = rule.walker()?;
  let hours = rule.kind.normalize_hours(rule.hours);

  let mut expansion = Expansion::default();
  for date in &walker {
    if !rule.weekdays.contains_date(date) {
      continue;
    }
    expansion.matched_days += 1;

    let key = DedupKey::new(rule.employee_id.clone(), date, rule.kind);
    if !index.insert(key) {
      expansion.skipped += 1;
      continue;
    }

    expansion.records.push(NewAttendance {
      employee_id: rule.employee_id.clone(),
      employee_name: rule.employee_name.clone(),
      date,
      start: None,
      hours,
      kind: rule.kind,
      note: rule.note.clone(),
      via_rule: true,
      source_rule_id: Some(rule.id),
    });
  }

  tracing::debug!(
    rule_id = %rule.id,
    days = walker.len(),
    matched = expansion.matched_days,
    proposed = expansion.records.len(),
    skipped = expansion.skipped,
    "expanded rule"
  );

  Ok(expansion)
}
