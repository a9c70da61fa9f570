//! Handlers for `/rules` endpoints.
//!
//! | Method   | Path                   | Notes |
//! |----------|------------------------|-------|
//! | `GET`    | `/rules`               | All rules, newest first |
//! | `POST`   | `/rules`               | Store + expand; 201 with the expansion report, 503 if no write succeeded |
//! | `GET`    | `/rules/{id}`          | 404 if not found |
//! | `DELETE` | `/rules/{id}`          | Rule only; `?retract=true` also removes its records |
//! | `GET`    | `/rules/{id}/records`  | Records generated by the rule |
//! | `POST`   | `/rules/{id}/expand`   | Idempotent re-sync |
//! | `POST`   | `/rules/{id}/retract`  | Delete generated records; works after the rule is gone |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kintai_core::{
  attendance::AttendanceRecord,
  expand::ExpansionOutcome,
  notify::{Notification, NotificationSink, deliver},
  retract::RetractionReport,
  rule::{RecurrenceRule, RuleDraft},
  schedule::{self, ExpansionReport},
  store::{AttendanceStore, RecordQuery, RuleStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiBackend, AppState, error::ApiError};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("rule {id} not found")) }

// ─── Collection ──────────────────────────────────────────────────────────────

/// `GET /rules`
pub async fn list<S, N>(
  State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<RecurrenceRule>>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let rules = state.store.list_rules().await.map_err(ApiError::store)?;
  Ok(Json(rules))
}

/// Status for an add or re-sync: `ok` unless every due write failed.
fn expansion_status(report: &ExpansionReport, ok: StatusCode) -> StatusCode {
  if report.outcome == ExpansionOutcome::Aborted {
    StatusCode::SERVICE_UNAVAILABLE
  } else {
    ok
  }
}

/// `POST /rules`: validates, stores and expands the rule.
///
/// Answers 503 with the report when the rule was stored but none of its
/// records could be written.
pub async fn create<S, N>(
  State(state): State<AppState<S, N>>,
  Json(draft): Json<RuleDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  // The session is only needed for the name lookup; release it before writing.
  let input = {
    let mut session = state.session.write().await;
    schedule::prepare_rule(&mut session, &*state.store, draft).await?
  };
  let report = schedule::store_and_expand(&*state.store, input).await?;

  if let Some(reason) = &report.aborted {
    tracing::warn!(rule_id = %report.rule.id, %reason, "expansion stopped early");
  }
  deliver(&*state.notifier, Notification::rule_expanded(&report)).await;

  Ok((expansion_status(&report, StatusCode::CREATED), Json(report)))
}

// ─── Single rule ─────────────────────────────────────────────────────────────

/// `GET /rules/{id}`
pub async fn get_one<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RecurrenceRule>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  state
    .store
    .get_rule(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| not_found(id))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
  #[serde(default)]
  pub retract: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
  pub rule:       RecurrenceRule,
  /// Present only when `?retract=true` was given.
  pub retraction: Option<RetractionReport>,
}

/// `DELETE /rules/{id}`
pub async fn delete<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DeleteParams>,
) -> Result<Json<DeleteResponse>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let rule = schedule::delete_rule(&*state.store, id).await?;

  let retraction = if params.retract {
    Some(schedule::retract_rule(&*state.store, id).await?)
  } else {
    None
  };

  let summary = retraction
    .clone()
    .unwrap_or_else(|| RetractionReport { rule_id: id, ..Default::default() });
  deliver(&*state.notifier, Notification::rule_deleted(Some(&rule), &summary)).await;

  Ok(Json(DeleteResponse { rule, retraction }))
}

/// `GET /rules/{id}/records`
///
/// Does not require the rule to exist: orphans of a deleted rule are listed
/// too.
pub async fn records<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let records = state
    .store
    .list_records(&RecordQuery::by_rule(id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

/// `POST /rules/{id}/expand`
pub async fn expand<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let report = schedule::resync_rule(&*state.store, id).await?;
  deliver(&*state.notifier, Notification::rule_resynced(&report)).await;
  Ok((expansion_status(&report, StatusCode::OK), Json(report)))
}

/// `POST /rules/{id}/retract`
pub async fn retract<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RetractionReport>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let rule = state.store.get_rule(id).await.map_err(ApiError::store)?;
  let report = schedule::retract_rule(&*state.store, id).await?;

  if !report.is_complete() {
    tracing::warn!(rule_id = %id, failed = report.failed.len(), "retraction incomplete");
  }
  deliver(&*state.notifier, Notification::rule_deleted(rule.as_ref(), &report)).await;

  Ok(Json(report))
}
