//! Error type for `kahal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kahal_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("calendar error: {0}")]
  Calendar(#[from] kahal_hebrew::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("row decode error: {0}")]
  Decode(String),
}

/// Collapse into the core taxonomy so the API layer can map statuses.
/// Domain errors pass through; everything else is an internal failure.
impl From<Error> for kahal_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(core) => core,
      other => kahal_core::Error::Internal(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
