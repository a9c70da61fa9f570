//! Handler for `GET /types`: the attendance types and their display labels.

use axum::Json;
use kintai_core::attendance::AttendanceType;
use serde::Serialize;
use strum::IntoEnumIterator as _;

#[derive(Debug, Serialize)]
pub struct TypeEntry {
  #[serde(rename = "type")]
  pub kind:  AttendanceType,
  pub label: &'static str,
}

pub async fn list() -> Json<Vec<TypeEntry>> {
  Json(
    AttendanceType::iter()
      .map(|kind| TypeEntry { kind, label: kind.label() })
      .collect(),
  )
}
