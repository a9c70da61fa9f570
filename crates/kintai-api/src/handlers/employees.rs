//! Handlers for `/employees` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/employees` | All employees, ordered by id |
//! | `POST` | `/employees` | Body: `{"id":"E1","name":"..."}`; renames if the id exists |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use kintai_core::{
  employee::{Employee, EmployeeId},
  notify::NotificationSink,
  store::EmployeeDirectory,
};
use serde::Deserialize;

use crate::{ApiBackend, AppState, error::ApiError};

/// `GET /employees`
pub async fn list<S, N>(
  State(state): State<AppState<S, N>>,
) -> Result<Json<Vec<Employee>>, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  let employees = state.store.list_employees().await.map_err(ApiError::store)?;
  Ok(Json(employees))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub id:   EmployeeId,
  pub name: String,
}

/// `POST /employees`: returns 201 + the stored [`Employee`].
pub async fn create<S, N>(
  State(state): State<AppState<S, N>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ApiBackend,
  N: NotificationSink,
{
  if body.id.is_blank() {
    return Err(ApiError::BadRequest("employee id is required".into()));
  }
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("employee name is required".into()));
  }

  let employee = state
    .store
    .add_employee(body.id, body.name)
    .await
    .map_err(ApiError::store)?;
  state.session.write().await.remember(&employee);

  Ok((StatusCode::CREATED, Json(employee)))
}
