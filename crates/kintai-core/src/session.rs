//! Per-session context threaded through the schedule service.

use std::collections::HashMap;

use crate::{
  employee::{Employee, EmployeeId},
  store::EmployeeDirectory,
};

/// Cached employee display names, used to denormalise `employee_name` onto
/// rules and records. Build one per session with [`Session::load`] and pass it
/// explicitly; there is no global cache.
#[derive(Debug, Clone, Default)]
pub struct Session {
  names: HashMap<EmployeeId, String>,
}

impl Session {
  pub fn new() -> Self { Self::default() }

  /// Prime the cache with every employee in `directory`.
  pub async fn load<D: EmployeeDirectory>(directory: &D) -> Result<Self, D::Error> {
    let mut session = Self::new();
    session.refresh(directory).await?;
    Ok(session)
  }

  /// Replace the cache with the directory's current contents.
  pub async fn refresh<D: EmployeeDirectory>(&mut self, directory: &D) -> Result<(), D::Error> {
    let employees = directory.list_employees().await?;
    self.names = employees.into_iter().map(|e| (e.id, e.name)).collect();
    tracing::debug!(employees = self.names.len(), "session cache refreshed");
    Ok(())
  }

  pub fn len(&self) -> usize { self.names.len() }

  pub fn is_empty(&self) -> bool { self.names.is_empty() }

  pub fn remember(&mut self, employee: &Employee) {
    self.names.insert(employee.id.clone(), employee.name.clone());
  }

  /// Cached name, if any.
  pub fn cached_name(&self, id: &EmployeeId) -> Option<&str> {
    self.names.get(id).map(String::as_str)
  }

  /// Cached name, falling back to a directory lookup. `None` means the
  /// employee does not exist.
  pub async fn employee_name<D: EmployeeDirectory>(
    &mut self,
    directory: &D,
    id: &EmployeeId,
  ) -> Result<Option<String>, D::Error> {
    if let Some(name) = self.names.get(id) {
      return Ok(Some(name.clone()));
    }
    let found = directory.get_employee(id.clone()).await?;
    if let Some(employee) = &found {
      self.remember(employee);
    }
    Ok(found.map(|e| e.name))
  }
}
