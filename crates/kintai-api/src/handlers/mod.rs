//! HTTP handlers, one module per resource.

pub mod employees;
pub mod records;
pub mod rules;
pub mod types;
