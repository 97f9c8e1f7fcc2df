//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use kahal_core::{Error as CoreError, relation::DuplicateCandidate};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// 409 — duplicate external relatives or a double-link attempt. The
  /// candidate list lets the caller link instead of duplicating.
  #[error("conflict: {message}")]
  Conflict {
    message:    String,
    candidates: Vec<DuplicateCandidate>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto the HTTP taxonomy via the core error type.
  pub fn from_store<E>(e: E) -> Self
  where
    E: Into<CoreError>,
  {
    match e.into() {
      e @ (CoreError::PersonNotFound(_)
      | CoreError::RelationNotFound(_)
      | CoreError::RelationTypeNotFound(_)
      | CoreError::NotificationNotFound(_)) => Self::NotFound(e.to_string()),

      e @ (CoreError::InvalidTarget | CoreError::MissingExternalName) => {
        Self::BadRequest(e.to_string())
      }

      e @ CoreError::AlreadyLinked(_) => Self::Conflict {
        message:    e.to_string(),
        candidates: Vec::new(),
      },

      CoreError::DuplicateExternal { candidates } => {
        let message = format!(
          "found {} possible existing record(s) for this relative",
          candidates.len()
        );
        Self::Conflict { message, candidates }
      }

      CoreError::Internal(source) => Self::Store(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Conflict { message, candidates } => {
        let body = if candidates.is_empty() {
          json!({ "error": message })
        } else {
          json!({ "error": message, "candidates": candidates })
        };
        (StatusCode::CONFLICT, Json(body)).into_response()
      }
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
      )
        .into_response(),
    }
  }
}
