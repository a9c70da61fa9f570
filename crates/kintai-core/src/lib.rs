//! Core types, storage traits and the recurring-schedule engine for Kintai.
//!
//! No HTTP or database dependencies.

// Store traits return `impl Future + Send`; impls use `async fn`.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod dedup;
pub mod employee;
pub mod error;
pub mod expand;
pub mod notify;
pub mod retract;
pub mod rule;
pub mod schedule;
pub mod session;
pub mod store;
pub mod walker;

pub use error::{Error, Result, ValidationError};

#[cfg(test)]
mod tests;
