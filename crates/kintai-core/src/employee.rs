//! Employees: the people attendance is recorded against.
//!
//! Records and rules refer to employees by [`EmployeeId`] only. The display
//! name is copied onto records at creation time so lists can be rendered
//! without a join.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of an employee in the directory.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Whitespace-only identifiers count as missing.
  pub fn is_blank(&self) -> bool { self.0.trim().is_empty() }
}

impl fmt::Display for EmployeeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EmployeeId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// A directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id:         EmployeeId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}
