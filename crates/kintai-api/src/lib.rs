//! JSON REST API for Kintai.
//!
//! Exposes an axum [`Router`] backed by any store implementing the
//! [`kintai_core::store`] traits. Auth, TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kintai_api::api_router(state))
//! ```

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use kintai_core::{
  notify::{NotificationSink, TracingSink},
  session::Session,
  store::{AttendanceStore, EmployeeDirectory, RuleStore},
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

use handlers::{employees, records, rules, types};

// ─── Backend bound ───────────────────────────────────────────────────────────

/// Everything the API needs from a storage backend.
pub trait ApiBackend: AttendanceStore + RuleStore + EmployeeDirectory + 'static {}

impl<T> ApiBackend for T where T: AttendanceStore + RuleStore + EmployeeDirectory + 'static {}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, N = TracingSink> {
  pub store:    Arc<S>,
  /// Employee name cache, loaded once at startup.
  pub session:  Arc<RwLock<Session>>,
  pub notifier: Arc<N>,
}

impl<S, N> Clone for AppState<S, N> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      session:  Arc::clone(&self.session),
      notifier: Arc::clone(&self.notifier),
    }
  }
}

impl<S: ApiBackend, N: NotificationSink> AppState<S, N> {
  /// Build state for `store`, priming the session from its employee directory.
  pub async fn new(store: Arc<S>, notifier: N) -> Result<Self, S::Error> {
    let session = Session::load(&*store).await?;
    Ok(Self {
      store,
      session: Arc::new(RwLock::new(session)),
      notifier: Arc::new(notifier),
    })
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(state: AppState<S, N>) -> Router<()>
where
  S: ApiBackend,
  N: NotificationSink + 'static,
{
  Router::new()
    // Reference data
    .route("/types", get(types::list))
    .route("/employees", get(employees::list::<S, N>).post(employees::create::<S, N>))
    // Records
    .route("/records", get(records::list::<S, N>).post(records::create::<S, N>))
    .route(
      "/records/{id}",
      get(records::get_one::<S, N>)
        .patch(records::update::<S, N>)
        .delete(records::delete::<S, N>),
    )
    // Rules
    .route("/rules", get(rules::list::<S, N>).post(rules::create::<S, N>))
    .route("/rules/{id}", get(rules::get_one::<S, N>).delete(rules::delete::<S, N>))
    .route("/rules/{id}/records", get(rules::records::<S, N>))
    .route("/rules/{id}/expand", post(rules::expand::<S, N>))
    .route("/rules/{id}/retract", post(rules::retract::<S, N>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
