//! Bulk removal of the records a rule generated.
//!
//! Deletions are independent store operations. A failed delete is recorded
//! and the remaining matches are still attempted; nothing is rolled back.
//! Re-running [`retract`] picks up whatever is left.

use serde::Serialize;
use uuid::Uuid;

use crate::{
  attendance::AttendanceRecord,
  store::{AttendanceStore, RecordQuery},
};

/// Records in `records` that were generated by `rule_id`, in input order.
pub fn find_by_rule(rule_id: Uuid, records: &[AttendanceRecord]) -> Vec<&AttendanceRecord> {
  records
    .iter()
    .filter(|r| r.source_rule_id == Some(rule_id))
    .collect()
}

/// A record the store refused to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
  pub id:     Uuid,
  pub reason: String,
}

/// Summary of a [`retract`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetractionReport {
  pub rule_id: Uuid,
  /// Records found with `source_rule_id == rule_id`.
  pub matched: usize,
  pub deleted: Vec<Uuid>,
  pub failed:  Vec<FailedDeletion>,
}

impl RetractionReport {
  pub fn deleted_count(&self) -> usize { self.deleted.len() }

  /// True when every matched record is gone.
  pub fn is_complete(&self) -> bool { self.failed.is_empty() }
}

/// Delete every record generated by `rule_id`.
///
/// Only listing the matches can fail the whole call. Individual delete
/// failures end up in [`RetractionReport::failed`]. A record that vanished
/// between listing and deleting counts as deleted.
pub async fn retract<S>(rule_id: Uuid, store: &S) -> Result<RetractionReport, S::Error>
where
  S: AttendanceStore,
{
  let matches = store.list_records(&RecordQuery::by_rule(rule_id)).await?;

  let mut report = RetractionReport {
    rule_id,
    matched: matches.len(),
    ..Default::default()
  };

  for record in matches {
    match store.delete_record(record.id).await {
      Ok(existed) => {
        if !existed {
          tracing::debug!(id = %record.id, "record already gone");
        }
        report.deleted.push(record.id);
      }
      Err(e) => {
        tracing::warn!(id = %record.id, error = %e, "failed to delete record");
        report.failed.push(FailedDeletion { id: record.id, reason: e.to_string() });
      }
    }
  }

  tracing::info!(
    %rule_id,
    matched = report.matched,
    deleted = report.deleted_count(),
    failed = report.failed.len(),
    "retracted rule records"
  );

  Ok(report)
}
