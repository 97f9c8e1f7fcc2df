//! JSON REST API for the Kahal registry.
//!
//! Exposes an axum [`Router`] backed by any
//! [`kahal_core::store::RegistryStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kahal_api::api_router(store.clone()))
//! ```

pub mod dates;
pub mod error;
pub mod notifications;
pub mod persons;
pub mod relations;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use kahal_core::store::RegistryStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RegistryStore + 'static,
{
  Router::new()
    // Persons
    .route("/persons", get(persons::list::<S>).post(persons::create::<S>))
    .route("/persons/search", post(persons::search::<S>))
    .route(
      "/persons/{id}",
      get(persons::get_one::<S>)
        .put(persons::update_one::<S>)
        .delete(persons::delete_one::<S>),
    )
    // Relations
    .route("/relations", post(relations::create::<S>))
    .route("/relations/types", get(relations::types::<S>))
    .route("/relations/person/{id}", get(relations::list_for_person::<S>))
    .route("/relations/tree/{id}", get(relations::family_tree::<S>))
    .route("/relations/{id}", delete(relations::delete_one::<S>))
    .route("/relations/{id}/link", post(relations::link::<S>))
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/{id}", delete(notifications::delete_one::<S>))
    // Dates
    .route("/dates/today", get(dates::today))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
