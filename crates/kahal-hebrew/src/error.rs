//! Error type for `kahal-hebrew`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The civil date could not be converted (out of the supported range).
  #[error("calendar conversion error: {0}")]
  Calendar(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
