//! The natural-key index used to keep rule expansion from creating duplicates.

use std::{collections::HashSet, fmt};

use chrono::NaiveDate;

use crate::{
  attendance::{AttendanceRecord, AttendanceType},
  employee::EmployeeId,
};

/// `(employee, date, type)`: the natural key of an attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
  pub employee_id: EmployeeId,
  pub date:        NaiveDate,
  pub kind:        AttendanceType,
}

impl DedupKey {
  pub fn new(employee_id: EmployeeId, date: NaiveDate, kind: AttendanceType) -> Self {
    Self { employee_id, date, kind }
  }

  pub fn of(record: &AttendanceRecord) -> Self {
    Self::new(record.employee_id.clone(), record.date, record.kind)
  }
}

/// Renders as `employee|YYYY-MM-DD|type`.
impl fmt::Display for DedupKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}|{}|{}", self.employee_id, self.date, self.kind.as_str())
  }
}

/// Keys of every record known to exist, plus every key proposed during the
/// current expansion pass.
#[derive(Debug, Clone, Default)]
pub struct DedupIndex {
  keys: HashSet<DedupKey>,
}

impl DedupIndex {
  pub fn new() -> Self { Self::default() }

  /// Snapshot the keys of `records`.
  pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
    Self { keys: records.into_iter().map(DedupKey::of).collect() }
  }

  pub fn contains(&self, key: &DedupKey) -> bool { self.keys.contains(key) }

  /// Returns `false` if the key was already present.
  pub fn insert(&mut self, key: DedupKey) -> bool { self.keys.insert(key) }

  pub fn len(&self) -> usize { self.keys.len() }

  pub fn is_empty(&self) -> bool { self.keys.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(date: u32, kind: AttendanceType) -> DedupKey {
    DedupKey::new(
      "E1".into(),
      NaiveDate::from_ymd_opt(2024, 1, date).unwrap(),
      kind,
    )
  }

  #[test]
  fn key_renders_pipe_separated() {
    assert_eq!(key(3, AttendanceType::Work).to_string(), "E1|2024-01-03|work");
  }

  #[test]
  fn type_is_part_of_the_key() {
    let mut index = DedupIndex::new();
    assert!(index.insert(key(1, AttendanceType::Work)));
    assert!(index.insert(key(1, AttendanceType::Overtime)));
    assert!(!index.insert(key(1, AttendanceType::Work)));
    assert_eq!(index.len(), 2);
    assert!(index.contains(&key(1, AttendanceType::Overtime)));
    assert!(!index.contains(&key(2, AttendanceType::Work)));
  }
}
