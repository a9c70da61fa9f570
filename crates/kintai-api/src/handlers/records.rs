//! Handlers for `/records` endpoints.
//!
//! | Method   | Path              | Notes |
//! |----------|-------------------|-------|
//! | `GET`    | `/records`        | Query: `employee_id`, `from`, `to`, `type`, `rule_id`, `via_rule`, `limit`, `offset` |
//! | `POST`   | `/records`        | Manual entry; returns 201 |
//! | `GET`    | `/records/{id}`   | 404 if not found |
//! | `PATCH`  | `/records/{id}`   | Partial update; hours re-normalised |
//! | `DELETE` | `/records/{id}`   | 204 on success |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use kintai_core::{
  ValidationError,
  attendance::{AttendancePatch, AttendanceRecord, AttendanceType, NewAttendance, check_hours},
  employee::EmployeeId,
  notify::{Notification, NotificationKind, NotificationSink, deliver},
  store::{AttendanceStore, RecordQuery},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiBackend, AppState, error::ApiError};

/// Page size applied when the client sends no `limit`.
const DEFAULT_LIMIT: usize = 500;

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("record {id} not found")) }

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub employee_id: Option<EmployeeId>,
  pub from:        Option<NaiveDate>,
  pub to:          Option<NaiveDate>,
  #[serde(rename = "type")]
  pub kind:        Option<AttendanceType>,
  pub rule_id:     Option<Uuid>,
  pub via_rule:    Option<bool>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

impl From<ListParams> for RecordQuery {
  fn from(p: ListParams) -> Self {
    Self {
      employee_id:    p.employee_id,
      from:           p.from,
      to:             p.to,
      kind:           p.kind,
      source_rule_id: p.rule_id,
      via_rule:       p.via_rule,
      limit:          Some(p.limit.unwrap_or(DEFAULT_LIMIT)),
      offset:         p.offset,
    }
  }
}

/// `GET /records`
pub async fn list<S, N>(
  State(state): State<AppState<S, N>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<AttendanceRecord>>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  if let (Some(from), Some(to)) = (params.from, params.to) {
    if from > to {
      return Err(ValidationError::InvertedRange { start: from, end: to }.into());
    }
  }

  let query = RecordQuery::from(params);
  let records = state.store.list_records(&query).await.map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub employee_id: EmployeeId,
  pub date:        NaiveDate,
  pub start:       Option<String>,
  #[serde(default)]
  pub hours:       f64,
  #[serde(rename = "type")]
  pub kind:        AttendanceType,
  pub note:        Option<String>,
}

/// `POST /records`: manual entry. Returns 201 + the stored record.
pub async fn create<S, N>(
  State(state): State<AppState<S, N>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  if body.employee_id.is_blank() {
    return Err(ValidationError::MissingEmployee.into());
  }
  let hours = check_hours(body.hours)?;

  let name = state
    .session
    .write()
    .await
    .employee_name(&*state.store, &body.employee_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ValidationError::UnknownEmployee(body.employee_id.clone()))?;

  let mut input = NewAttendance::manual(body.employee_id, body.date, body.kind, hours);
  input.employee_name = Some(name);
  input.start = body.start.filter(|s| !s.trim().is_empty());
  input.note = body.note.filter(|n| !n.trim().is_empty());

  let record = state.store.create_record(input).await.map_err(ApiError::store)?;
  tracing::info!(record_id = %record.id, employee = %record.employee_id, "record created");

  deliver(
    &*state.notifier,
    Notification::for_record(NotificationKind::RecordCreated, &record),
  )
  .await;

  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Single record ───────────────────────────────────────────────────────────

/// `GET /records/{id}`
pub async fn get_one<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<AttendanceRecord>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  state
    .store
    .get_record(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| not_found(id))
}

/// `PATCH /records/{id}`
pub async fn update<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<AttendancePatch>,
) -> Result<Json<AttendanceRecord>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  if let Some(hours) = patch.hours {
    check_hours(hours)?;
  }

  let record = state
    .store
    .update_record(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  deliver(
    &*state.notifier,
    Notification::for_record(NotificationKind::RecordUpdated, &record),
  )
  .await;

  Ok(Json(record))
}

/// `DELETE /records/{id}`: returns 204 No Content.
pub async fn delete<S, N>(
  State(state): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let record = state
    .store
    .get_record(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  if !state.store.delete_record(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }

  deliver(
    &*state.notifier,
    Notification::for_record(NotificationKind::RecordDeleted, &record),
  )
  .await;

  Ok(StatusCode::NO_CONTENT)
}
