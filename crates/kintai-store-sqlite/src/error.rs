//! Error type for `kintai-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kintai_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored weekday set failed validation on the way out.
  #[error("invalid stored weekdays: {0}")]
  Weekdays(#[from] kintai_core::ValidationError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
