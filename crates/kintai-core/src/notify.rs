//! Notification summaries for record and rule changes.
//!
//! The core only builds the message. Delivery (push, webhook, ...) belongs to
//! whatever [`NotificationSink`] the integration layer plugs in.

use std::{convert::Infallible, future::Future};

use serde::Serialize;
use serde_json::json;

use crate::{
  attendance::AttendanceRecord,
  retract::RetractionReport,
  rule::RecurrenceRule,
  schedule::ExpansionReport,
};

const FALLBACK_NAME: &str = "社員";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
  RecordCreated,
  RecordUpdated,
  RecordDeleted,
  RuleExpanded,
  RuleResynced,
  RuleDeleted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
  pub kind:    NotificationKind,
  pub title:   String,
  pub body:    String,
  pub payload: serde_json::Value,
}

fn display_name(name: Option<&str>) -> &str {
  name.filter(|n| !n.is_empty()).unwrap_or(FALLBACK_NAME)
}

/// `2024-01-01 出勤 8h – note`
fn record_body(record: &AttendanceRecord) -> String {
  let mut body = format!("{} {} {}h", record.date, record.kind.label(), record.hours);
  if let Some(note) = record.note.as_deref().filter(|n| !n.is_empty()) {
    body.push_str(" – ");
    body.push_str(note);
  }
  body
}

/// `2024-01-01〜2024-01-10 (月水) 出勤 8h`
fn rule_line(rule: &RecurrenceRule) -> String {
  format!(
    "{}〜{} ({}) {} {}h",
    rule.start_date,
    rule.end_date,
    rule.weekdays,
    rule.kind.label(),
    rule.hours
  )
}

impl Notification {
  /// Summary for a single record event. `kind` must be one of the
  /// `Record*` variants.
  pub fn for_record(kind: NotificationKind, record: &AttendanceRecord) -> Self {
    let name = display_name(record.employee_name.as_deref());
    let title = match kind {
      NotificationKind::RecordCreated => format!("新しい予定: {name}"),
      NotificationKind::RecordUpdated => format!("予定を更新: {name}"),
      NotificationKind::RecordDeleted => format!("予定を削除: {name}"),
      NotificationKind::RuleExpanded
      | NotificationKind::RuleResynced
      | NotificationKind::RuleDeleted => "勤怠通知".to_owned(),
    };
    Self {
      kind,
      title,
      body: record_body(record),
      payload: json!({
        "record_id": record.id,
        "employee_id": record.employee_id,
        "date": record.date,
        "type": record.kind,
        "hours": record.hours,
      }),
    }
  }

  /// Summary after a rule was stored and expanded.
  pub fn rule_expanded(report: &ExpansionReport) -> Self {
    Self::expansion(NotificationKind::RuleExpanded, "繰り返し予定を追加", report)
  }

  /// Summary after an existing rule was expanded again.
  pub fn rule_resynced(report: &ExpansionReport) -> Self {
    Self::expansion(NotificationKind::RuleResynced, "繰り返し予定を再同期", report)
  }

  fn expansion(kind: NotificationKind, heading: &str, report: &ExpansionReport) -> Self {
    let rule = &report.rule;
    let name = display_name(rule.employee_name.as_deref());
    Self {
      kind,
      title: format!("{heading}: {name}"),
      body: format!(
        "{} 作成 {}件 / スキップ {}件",
        rule_line(rule),
        report.created_count(),
        report.skipped
      ),
      payload: json!({
        "rule": rule,
        "created": report.created_count(),
        "skipped": report.skipped,
        "matched_days": report.matched_days,
        "outcome": report.outcome,
        "aborted": report.aborted,
      }),
    }
  }

  /// Summary after a rule's records were retracted.
  pub fn rule_deleted(rule: Option<&RecurrenceRule>, report: &RetractionReport) -> Self {
    let name = display_name(rule.and_then(|r| r.employee_name.as_deref()));
    let line = rule.map(rule_line).unwrap_or_else(|| report.rule_id.to_string());
    Self {
      kind:    NotificationKind::RuleDeleted,
      title:   format!("繰り返し予定を削除: {name}"),
      body:    format!(
        "{} 削除 {}件 / 失敗 {}件",
        line,
        report.deleted_count(),
        report.failed.len()
      ),
      payload: json!({
        "rule_id": report.rule_id,
        "rule": rule,
        "matched": report.matched,
        "deleted": report.deleted_count(),
        "failed": report.failed,
      }),
    }
  }
}

// ─── Sinks ───────────────────────────────────────────────────────────────────

/// Destination for notifications. Failures are reported to the caller, which
/// logs them; they never undo the change being announced.
pub trait NotificationSink: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn notify(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Writes every notification to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
  type Error = Infallible;

  async fn notify(&self, notification: Notification) -> Result<(), Infallible> {
    tracing::info!(
      kind = ?notification.kind,
      title = %notification.title,
      body = %notification.body,
      "notification"
    );
    Ok(())
  }
}

/// Send `notification` through `sink`, logging instead of propagating errors.
pub async fn deliver<N: NotificationSink>(sink: &N, notification: Notification) {
  let kind = notification.kind;
  if let Err(e) = sink.notify(notification).await {
    tracing::warn!(?kind, error = %e, "notification delivery failed");
  }
}
