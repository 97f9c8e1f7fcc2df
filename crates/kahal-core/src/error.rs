//! Error types for `kahal-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::relation::DuplicateCandidate;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("relation not found: {0}")]
  RelationNotFound(Uuid),

  #[error("unknown relation type: {0:?}")]
  RelationTypeNotFound(String),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  /// Exactly one of `related_person_id` / `external_info` must be given.
  #[error(
    "a relation must target either a registered person or an external \
     person record, not both and not neither"
  )]
  InvalidTarget,

  #[error("external person info must carry a first and last name")]
  MissingExternalName,

  #[error("relation {0} already references a registered person")]
  AlreadyLinked(Uuid),

  /// Candidate matches are surfaced so the caller can link instead of
  /// inserting a duplicate external relative.
  #[error("found {} possible existing record(s) for this relative", candidates.len())]
  DuplicateExternal { candidates: Vec<DuplicateCandidate> },

  #[error("storage error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
