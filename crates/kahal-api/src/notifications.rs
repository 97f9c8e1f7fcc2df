//! Handlers for `/notifications` endpoints.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use kahal_core::{notification::Notification, store::RegistryStore};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /notifications` — newest first.
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: RegistryStore,
{
  let notifications = store
    .list_notifications()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(notifications))
}

/// `DELETE /notifications/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
{
  store
    .delete_notification(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
