//! The `RegistryStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `kahal-store-sqlite`).
//! Higher layers (`kahal-api`, `kahal-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  catalog::RelationTypeEntry,
  notification::{NewNotification, Notification},
  person::{NewPerson, Person, PersonQuery, PersonUpdate},
  relation::{
    DuplicateCandidate, DuplicateProbe, NewRelation, Relation, RelationRecord,
  },
};

/// Abstraction over a Kahal registry backend.
///
/// Relation mutations are multi-step (existence checks, duplicate check,
/// forward edge, derived reverse edge); implementations must run each
/// mutating call inside a single transaction so a partially-created edge
/// pair is never observable.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error
    + Into<crate::Error>
    + Send
    + Sync
    + 'static;

  // ── Person directory ──────────────────────────────────────────────────

  /// Register a person. Derived fields (age, Hebrew birth-date label) are
  /// computed from the birth date by the store.
  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Replace a person's stored fields and recompute the derived ones.
  fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Delete a person. Edges the person owns are removed; edges pointing at
  /// the person are rewritten into external stubs so the other party's
  /// relational history survives.
  fn delete_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fuzzy search over registered persons (substring names, ±2-year birth
  /// window), capped at 20 rows.
  fn search_persons<'a>(
    &'a self,
    query: &'a PersonQuery,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;

  /// Recompute age and Hebrew birth-date label for every person with a
  /// birth date. Returns the number of rows updated.
  fn refresh_derived(
    &self,
    today: NaiveDate,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Relation-type catalog ─────────────────────────────────────────────

  /// Insert each fixed catalog row unless its symbol is already present.
  /// Idempotent and safe to call repeatedly.
  fn ensure_seeded(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All catalog rows, ordered by the primary display name.
  fn list_relation_types(
    &self,
  ) -> impl Future<Output = Result<Vec<RelationTypeEntry>, Self::Error>> + Send + '_;

  fn get_relation_type<'a>(
    &'a self,
    symbol: &'a str,
  ) -> impl Future<Output = Result<Option<RelationTypeEntry>, Self::Error>> + Send + 'a;

  // ── Relation graph ────────────────────────────────────────────────────

  /// Persist a relation edge, optionally with its gender-corrected reverse
  /// edge, inside one transaction. See [`NewRelation`] for the flags.
  fn create_relation(
    &self,
    input: NewRelation,
  ) -> impl Future<Output = Result<Relation, Self::Error>> + Send + '_;

  fn get_relation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Relation>, Self::Error>> + Send + '_;

  /// A person's outgoing edges ordered by relation-type symbol, optionally
  /// enriched with the related person's public fields.
  fn list_relations(
    &self,
    person_id: Uuid,
    include_details: bool,
  ) -> impl Future<Output = Result<Vec<RelationRecord>, Self::Error>> + Send + '_;

  /// Delete an edge; with `delete_reverse`, also best-effort delete the
  /// counterpart found by swapping the endpoints and matching the
  /// reciprocal family of the edge's type.
  fn delete_relation(
    &self,
    id: Uuid,
    delete_reverse: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Rewrite an external edge so it references a registered person,
  /// clearing the inline info; optionally derive the reverse edge.
  fn link_external_to_registered(
    &self,
    relation_id: Uuid,
    person_id: Uuid,
    create_reverse: bool,
  ) -> impl Future<Output = Result<Relation, Self::Error>> + Send + '_;

  /// Plausible existing external-relative records matching the probe.
  /// Fails open: a probe without both names yields an empty list.
  fn find_external_duplicates<'a>(
    &'a self,
    probe: &'a DuplicateProbe,
  ) -> impl Future<Output = Result<Vec<DuplicateCandidate>, Self::Error>> + Send + 'a;

  // ── Notifications ─────────────────────────────────────────────────────

  fn add_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  fn list_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  fn delete_notification(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
