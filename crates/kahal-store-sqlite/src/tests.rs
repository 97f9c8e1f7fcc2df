//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use kahal_core::{
  Error as CoreError,
  notification::{NewNotification, NotificationKind, NotificationStatus},
  person::{NewPerson, PersonQuery, PersonUpdate, Sex},
  relation::{
    DuplicateProbe, ExternalPersonInfo, NewRelation, RelationTarget,
  },
  store::RegistryStore,
  tree::{TreeBranch, build_tree},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory().await.expect("in-memory store");
  s.ensure_seeded().await.expect("seeded catalog");
  s
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn new_person(first: &str, last: &str, sex: Option<Sex>) -> NewPerson {
  NewPerson {
    first_name: first.into(),
    last_name: last.into(),
    father_name: None,
    birth_date: None,
    sex,
    mobile_number: None,
    email: None,
    address: None,
    religious_info: None,
    notes: None,
  }
}

fn external(first: &str, last: &str) -> ExternalPersonInfo {
  ExternalPersonInfo {
    first_name: Some(first.into()),
    last_name: Some(last.into()),
    ..Default::default()
  }
}

fn registered(person_id: Uuid) -> RelationTarget {
  RelationTarget::Registered { person_id }
}

fn relation(owner: Uuid, symbol: &str, target: RelationTarget) -> NewRelation {
  NewRelation {
    owner_id: owner,
    relation_type: symbol.into(),
    target,
    notes: None,
    create_reverse: true,
    check_duplicates: false,
  }
}

// ─── Person directory ────────────────────────────────────────────────────────

#[tokio::test]
async fn add_person_derives_age_and_hebrew_date() {
  let s = store().await;

  let mut input = new_person("Moshe", "Katz", Some(Sex::Male));
  input.birth_date = Some(d(1990, 6, 15));
  let person = s.add_person(input).await.unwrap();

  let expected_age =
    kahal_hebrew::age_on(d(1990, 6, 15), Utc::now().date_naive());
  assert_eq!(person.age, Some(expected_age));
  assert_eq!(
    person.hebrew_birth_date.as_deref(),
    Some(kahal_hebrew::hebrew_label(d(1990, 6, 15)).unwrap().as_str())
  );

  let fetched = s.get_person(person.person_id).await.unwrap().unwrap();
  assert_eq!(fetched.first_name, "Moshe");
  assert_eq!(fetched.age, person.age);
  assert_eq!(fetched.sex, Some(Sex::Male));
}

#[tokio::test]
async fn add_person_without_birth_date_has_no_derived_fields() {
  let s = store().await;
  let person = s
    .add_person(new_person("Sara", "Levi", Some(Sex::Female)))
    .await
    .unwrap();
  assert_eq!(person.age, None);
  assert_eq!(person.hebrew_birth_date, None);
}

#[tokio::test]
async fn get_person_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_person_recomputes_derived_fields() {
  let s = store().await;
  let person = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  assert_eq!(person.age, None);

  let updated = s
    .update_person(person.person_id, PersonUpdate {
      first_name:     "Moshe".into(),
      last_name:      "Katz".into(),
      father_name:    Some("David".into()),
      birth_date:     Some(d(2000, 1, 1)),
      sex:            Some(Sex::Male),
      mobile_number:  None,
      email:          None,
      address:        None,
      religious_info: None,
      notes:          None,
    })
    .await
    .unwrap();

  let expected_age = kahal_hebrew::age_on(d(2000, 1, 1), Utc::now().date_naive());
  assert_eq!(updated.age, Some(expected_age));
  assert!(updated.hebrew_birth_date.is_some());
  assert_eq!(updated.father_name.as_deref(), Some("David"));

  let fetched = s.get_person(person.person_id).await.unwrap().unwrap();
  assert_eq!(fetched.age, Some(expected_age));
  assert_eq!(fetched.created_at, person.created_at);
}

#[tokio::test]
async fn update_missing_person_errors() {
  let s = store().await;
  let err = s
    .update_person(Uuid::new_v4(), PersonUpdate {
      first_name:     "X".into(),
      last_name:      "Y".into(),
      father_name:    None,
      birth_date:     None,
      sex:            None,
      mobile_number:  None,
      email:          None,
      address:        None,
      religious_info: None,
      notes:          None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PersonNotFound(_))));
}

#[tokio::test]
async fn delete_person_rewrites_inbound_edges_to_stubs() {
  let s = store().await;
  let a = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let b = s
    .add_person(new_person("Sara", "Katz", Some(Sex::Female)))
    .await
    .unwrap();

  // A -> B plus the derived B -> A edge.
  s.create_relation(relation(a.person_id, "brother", registered(b.person_id)))
    .await
    .unwrap();

  s.delete_person(b.person_id).await.unwrap();
  assert!(s.get_person(b.person_id).await.unwrap().is_none());

  // A's edge survives as an external stub carrying B's fields.
  let records = s.list_relations(a.person_id, true).await.unwrap();
  assert_eq!(records.len(), 1);
  assert!(records[0].related.is_none());
  match &records[0].relation.target {
    RelationTarget::External { info } => {
      assert_eq!(info.first_name.as_deref(), Some("Sara"));
      assert_eq!(info.last_name.as_deref(), Some("Katz"));
      assert_eq!(info.sex, Some(Sex::Female));
    }
    other => panic!("expected external stub, got {other:?}"),
  }

  // B's own outbound edge is gone.
  assert!(s.list_relations(b.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_person_errors() {
  let s = store().await;
  let err = s.delete_person(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PersonNotFound(_))));
}

#[tokio::test]
async fn search_persons_by_name_substring() {
  let s = store().await;
  s.add_person(new_person("Moshe", "Katz", None)).await.unwrap();
  s.add_person(new_person("Sara", "Katz", None)).await.unwrap();
  s.add_person(new_person("Rivka", "Levi", None)).await.unwrap();

  let katz = s
    .search_persons(&PersonQuery {
      last_name: Some("katz".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(katz.len(), 2);

  let moshe = s
    .search_persons(&PersonQuery {
      first_name: Some("mos".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(moshe.len(), 1);
  assert_eq!(moshe[0].first_name, "Moshe");
}

#[tokio::test]
async fn search_persons_birth_date_uses_a_two_year_window() {
  let s = store().await;
  let mut older = new_person("Moshe", "Katz", None);
  older.birth_date = Some(d(1990, 5, 1));
  s.add_person(older).await.unwrap();
  let mut younger = new_person("Sara", "Katz", None);
  younger.birth_date = Some(d(1993, 6, 15));
  s.add_person(younger).await.unwrap();

  let hits = s
    .search_persons(&PersonQuery {
      birth_date: Some(d(1994, 1, 1)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].first_name, "Sara");
}

#[tokio::test]
async fn refresh_derived_recomputes_ages_for_a_given_day() {
  let s = store().await;
  let mut input = new_person("Moshe", "Katz", None);
  input.birth_date = Some(d(1990, 6, 15));
  let person = s.add_person(input).await.unwrap();
  s.add_person(new_person("Sara", "Levi", None)).await.unwrap();

  let updated = s.refresh_derived(d(2030, 6, 16)).await.unwrap();
  assert_eq!(updated, 1);

  let fetched = s.get_person(person.person_id).await.unwrap().unwrap();
  assert_eq!(fetched.age, Some(40));
}

// ─── Relation-type catalog ───────────────────────────────────────────────────

#[tokio::test]
async fn seeding_is_idempotent() {
  let s = store().await;
  s.ensure_seeded().await.unwrap();
  s.ensure_seeded().await.unwrap();

  let types = s.list_relation_types().await.unwrap();
  assert_eq!(types.len(), 18);
}

#[tokio::test]
async fn types_are_ordered_by_display_name() {
  let s = store().await;
  let types = s.list_relation_types().await.unwrap();
  // "Бабушка" (grandmother) sorts first in the Russian catalog.
  assert_eq!(types[0].symbol, "grandmother");
}

#[tokio::test]
async fn get_relation_type_by_symbol() {
  let s = store().await;
  let entry = s.get_relation_type("father").await.unwrap().unwrap();
  assert_eq!(entry.reciprocal.as_deref(), Some("child"));
  assert!(entry.gender_specific);

  assert!(s.get_relation_type("stranger").await.unwrap().is_none());
}

// ─── Relation creation ───────────────────────────────────────────────────────

#[tokio::test]
async fn create_with_reverse_persists_a_gender_corrected_pair() {
  let s = store().await;
  let father = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let daughter = s
    .add_person(new_person("Sara", "Katz", Some(Sex::Female)))
    .await
    .unwrap();

  let edge = s
    .create_relation(relation(
      father.person_id,
      "father",
      registered(daughter.person_id),
    ))
    .await
    .unwrap();
  assert_eq!(edge.relation_type, "father");

  let forward = s.list_relations(father.person_id, false).await.unwrap();
  assert_eq!(forward.len(), 1);
  assert_eq!(
    forward[0].relation.target.registered_id(),
    Some(daughter.person_id)
  );

  let reverse = s.list_relations(daughter.person_id, false).await.unwrap();
  assert_eq!(reverse.len(), 1);
  assert_eq!(reverse[0].relation.relation_type, "daughter");
  assert_eq!(
    reverse[0].relation.target.registered_id(),
    Some(father.person_id)
  );
}

#[tokio::test]
async fn reverse_for_unknown_sex_keeps_the_base_symbol() {
  let s = store().await;
  let father = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let child = s.add_person(new_person("Noam", "Katz", None)).await.unwrap();

  s.create_relation(relation(
    father.person_id,
    "father",
    registered(child.person_id),
  ))
  .await
  .unwrap();

  let reverse = s.list_relations(child.person_id, false).await.unwrap();
  assert_eq!(reverse.len(), 1);
  assert_eq!(reverse[0].relation.relation_type, "child");
}

#[tokio::test]
async fn create_without_reverse_persists_one_edge() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  let mut input = relation(a.person_id, "brother", registered(b.person_id));
  input.create_reverse = false;
  s.create_relation(input).await.unwrap();

  assert_eq!(s.list_relations(a.person_id, false).await.unwrap().len(), 1);
  assert!(s.list_relations(b.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_relation_round_trip() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  let mut input = relation(a.person_id, "brother", registered(b.person_id));
  input.create_reverse = false;
  input.notes = Some("met at shul".into());
  let created = s.create_relation(input).await.unwrap();

  let fetched = s
    .get_relation(created.relation_id)
    .await
    .unwrap()
    .expect("stored edge");
  assert_eq!(fetched.owner_id, a.person_id);
  assert_eq!(fetched.relation_type, "brother");
  assert_eq!(fetched.notes.as_deref(), Some("met at shul"));

  assert!(s.get_relation(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn create_for_missing_owner_errors() {
  let s = store().await;
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  let err = s
    .create_relation(relation(Uuid::new_v4(), "father", registered(b.person_id)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PersonNotFound(_))));
}

#[tokio::test]
async fn create_for_missing_target_errors_and_writes_nothing() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();

  let err = s
    .create_relation(relation(a.person_id, "father", registered(Uuid::new_v4())))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PersonNotFound(_))));
  assert!(s.list_relations(a.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_with_unseeded_type_errors() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  let err = s
    .create_relation(relation(a.person_id, "stranger", registered(b.person_id)))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::RelationTypeNotFound(ref symbol)) if symbol == "stranger"
  ));
}

#[tokio::test]
async fn external_target_without_name_errors() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();

  let mut info = external("Moshe", "Katz");
  info.last_name = None;
  let err = s
    .create_relation(relation(
      a.person_id,
      "uncle",
      RelationTarget::External { info },
    ))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::MissingExternalName)));
  assert!(s.list_relations(a.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_relations_orders_by_type_symbol() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  for symbol in ["uncle", "brother", "father"] {
    let mut input = relation(a.person_id, symbol, registered(b.person_id));
    input.create_reverse = false;
    s.create_relation(input).await.unwrap();
  }

  let records = s.list_relations(a.person_id, false).await.unwrap();
  let symbols: Vec<_> = records
    .iter()
    .map(|r| r.relation.relation_type.as_str())
    .collect();
  assert_eq!(symbols, ["brother", "father", "uncle"]);
}

#[tokio::test]
async fn list_relations_enriches_registered_targets() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s
    .add_person(new_person("Sara", "Katz", Some(Sex::Female)))
    .await
    .unwrap();

  let mut input = relation(a.person_id, "brother", registered(b.person_id));
  input.create_reverse = false;
  s.create_relation(input).await.unwrap();

  let detailed = s.list_relations(a.person_id, true).await.unwrap();
  let related = detailed[0].related.as_ref().expect("enriched summary");
  assert_eq!(related.first_name, "Sara");
  assert_eq!(related.sex, Some(Sex::Female));

  let plain = s.list_relations(a.person_id, false).await.unwrap();
  assert!(plain[0].related.is_none());
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_check_blocks_matching_external_inserts() {
  let s = store().await;
  let a = s.add_person(new_person("Moshe", "Katz", None)).await.unwrap();
  let b = s.add_person(new_person("Sara", "Levi", None)).await.unwrap();

  s.create_relation(relation(
    a.person_id,
    "uncle",
    RelationTarget::External { info: external("Chaim", "Stern") },
  ))
  .await
  .unwrap();

  let mut input = relation(
    b.person_id,
    "uncle",
    RelationTarget::External { info: external("chaim", "STERN") },
  );
  input.check_duplicates = true;
  let err = s.create_relation(input).await.unwrap_err();

  match err {
    Error::Core(CoreError::DuplicateExternal { candidates }) => {
      assert_eq!(candidates.len(), 1);
      assert_eq!(candidates[0].owner_name, "Moshe Katz");
      assert_eq!(candidates[0].info.first_name.as_deref(), Some("Chaim"));
    }
    other => panic!("expected DuplicateExternal, got {other:?}"),
  }

  // Nothing was persisted for B.
  assert!(s.list_relations(b.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_check_off_allows_the_insert() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  for owner in [a.person_id, b.person_id] {
    s.create_relation(relation(
      owner,
      "uncle",
      RelationTarget::External { info: external("Chaim", "Stern") },
    ))
    .await
    .unwrap();
  }

  assert_eq!(s.list_relations(b.person_id, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_external_duplicates_fails_open_without_names() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  s.create_relation(relation(
    a.person_id,
    "uncle",
    RelationTarget::External { info: external("Chaim", "Stern") },
  ))
  .await
  .unwrap();

  let hits = s
    .find_external_duplicates(&DuplicateProbe::default())
    .await
    .unwrap();
  assert!(hits.is_empty());

  let hits = s
    .find_external_duplicates(&DuplicateProbe {
      first_name: Some("Chaim".into()),
      last_name:  Some("Stern".into()),
      birth_date: None,
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
}

// ─── Relation deletion ───────────────────────────────────────────────────────

#[tokio::test]
async fn delete_with_reverse_removes_the_pair() {
  let s = store().await;
  let a = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let b = s
    .add_person(new_person("Sara", "Katz", Some(Sex::Female)))
    .await
    .unwrap();

  let edge = s
    .create_relation(relation(a.person_id, "father", registered(b.person_id)))
    .await
    .unwrap();

  s.delete_relation(edge.relation_id, true).await.unwrap();
  assert!(s.list_relations(a.person_id, false).await.unwrap().is_empty());
  assert!(s.list_relations(b.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_reverse_only_touches_the_reciprocal_family() {
  let s = store().await;
  let a = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let b = s
    .add_person(new_person("Sara", "Katz", Some(Sex::Female)))
    .await
    .unwrap();

  // Two independent pairs between the same two people.
  let spouse_edge = s
    .create_relation(relation(a.person_id, "husband", registered(b.person_id)))
    .await
    .unwrap();
  s.create_relation(relation(a.person_id, "father", registered(b.person_id)))
    .await
    .unwrap();

  s.delete_relation(spouse_edge.relation_id, true).await.unwrap();

  // The "wife" reverse is gone; the "daughter" reverse is untouched.
  let b_edges = s.list_relations(b.person_id, false).await.unwrap();
  let symbols: Vec<_> = b_edges
    .iter()
    .map(|r| r.relation.relation_type.as_str())
    .collect();
  assert_eq!(symbols, ["daughter"]);
}

#[tokio::test]
async fn delete_without_matching_reverse_succeeds() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let b = s.add_person(new_person("B", "X", None)).await.unwrap();

  let mut input = relation(a.person_id, "brother", registered(b.person_id));
  input.create_reverse = false;
  let edge = s.create_relation(input).await.unwrap();

  s.delete_relation(edge.relation_id, true).await.unwrap();
  assert!(s.list_relations(a.person_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_relation_errors() {
  let s = store().await;
  let err = s.delete_relation(Uuid::new_v4(), false).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::RelationNotFound(_))));
}

// ─── Linking external relatives ──────────────────────────────────────────────

#[tokio::test]
async fn link_external_rewrites_the_edge_and_derives_the_reverse() {
  let s = store().await;
  let a = s.add_person(new_person("Moshe", "Katz", None)).await.unwrap();
  let registered_relative = s
    .add_person(new_person("Chaim", "Stern", Some(Sex::Male)))
    .await
    .unwrap();

  // A is the father of an external relative.
  let edge = s
    .create_relation(relation(
      a.person_id,
      "father",
      RelationTarget::External { info: external("Chaim", "Stern") },
    ))
    .await
    .unwrap();

  let updated = s
    .link_external_to_registered(
      edge.relation_id,
      registered_relative.person_id,
      true,
    )
    .await
    .unwrap();
  assert_eq!(
    updated.target.registered_id(),
    Some(registered_relative.person_id)
  );

  let a_edges = s.list_relations(a.person_id, true).await.unwrap();
  assert_eq!(
    a_edges[0].relation.target.registered_id(),
    Some(registered_relative.person_id)
  );
  assert_eq!(
    a_edges[0].related.as_ref().map(|p| p.first_name.as_str()),
    Some("Chaim")
  );

  // The reverse edge was derived from the linked person's sex.
  let reverse = s
    .list_relations(registered_relative.person_id, false)
    .await
    .unwrap();
  assert_eq!(reverse.len(), 1);
  assert_eq!(reverse[0].relation.relation_type, "son");
  assert_eq!(
    reverse[0].relation.target.registered_id(),
    Some(a.person_id)
  );
}

#[tokio::test]
async fn link_twice_errors_with_already_linked() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();
  let c = s.add_person(new_person("C", "X", None)).await.unwrap();

  let edge = s
    .create_relation(relation(
      a.person_id,
      "uncle",
      RelationTarget::External { info: external("Chaim", "Stern") },
    ))
    .await
    .unwrap();

  s.link_external_to_registered(edge.relation_id, c.person_id, false)
    .await
    .unwrap();
  let err = s
    .link_external_to_registered(edge.relation_id, c.person_id, false)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AlreadyLinked(_))));
}

#[tokio::test]
async fn link_to_missing_person_errors() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();

  let edge = s
    .create_relation(relation(
      a.person_id,
      "uncle",
      RelationTarget::External { info: external("Chaim", "Stern") },
    ))
    .await
    .unwrap();

  let err = s
    .link_external_to_registered(edge.relation_id, Uuid::new_v4(), false)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PersonNotFound(_))));
}

#[tokio::test]
async fn link_missing_relation_errors() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();

  let err = s
    .link_external_to_registered(Uuid::new_v4(), a.person_id, false)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::RelationNotFound(_))));
}

// ─── Family tree ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn tree_terminates_on_a_mutual_spouse_cycle() {
  let s = store().await;
  let a = s
    .add_person(new_person("Moshe", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let b = s
    .add_person(new_person("Sara", "Katz", Some(Sex::Female)))
    .await
    .unwrap();

  // A husband-> B and the derived B wife-> A.
  s.create_relation(relation(a.person_id, "husband", registered(b.person_id)))
    .await
    .unwrap();

  let tree = build_tree(&s, a.person_id, 3).await.unwrap().unwrap();
  assert_eq!(tree.person.person_id, a.person_id);

  let spouses = &tree.relations["husband"];
  assert_eq!(spouses.len(), 1);
  match &spouses[0] {
    TreeBranch::Member { node } => {
      assert_eq!(node.person.person_id, b.person_id);
      // A is already visited, so B's wife edge is not expanded again.
      assert!(node.relations.is_empty());
    }
    other => panic!("expected registered member, got {other:?}"),
  }
}

#[tokio::test]
async fn tree_depth_zero_and_unknown_root_return_none() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();

  assert!(build_tree(&s, a.person_id, 0).await.unwrap().is_none());
  assert!(build_tree(&s, Uuid::new_v4(), 2).await.unwrap().is_none());
}

#[tokio::test]
async fn tree_includes_external_relatives_as_leaf_stubs() {
  let s = store().await;
  let a = s.add_person(new_person("A", "X", None)).await.unwrap();

  s.create_relation(relation(
    a.person_id,
    "nephew",
    RelationTarget::External { info: external("Chaim", "Stern") },
  ))
  .await
  .unwrap();

  let tree = build_tree(&s, a.person_id, 2).await.unwrap().unwrap();
  match &tree.relations["nephew"][0] {
    TreeBranch::External { info, not_in_registry } => {
      assert!(not_in_registry);
      assert_eq!(info.first_name.as_deref(), Some("Chaim"));
    }
    other => panic!("expected external stub, got {other:?}"),
  }
}

#[tokio::test]
async fn tree_depth_limits_expansion() {
  let s = store().await;
  let grandfather = s
    .add_person(new_person("Avraham", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let father = s
    .add_person(new_person("Yitzchak", "Katz", Some(Sex::Male)))
    .await
    .unwrap();
  let son = s
    .add_person(new_person("Yaakov", "Katz", Some(Sex::Male)))
    .await
    .unwrap();

  let mut input =
    relation(grandfather.person_id, "father", registered(father.person_id));
  input.create_reverse = false;
  s.create_relation(input).await.unwrap();
  let mut input = relation(father.person_id, "father", registered(son.person_id));
  input.create_reverse = false;
  s.create_relation(input).await.unwrap();

  // Depth 2: the father level is expanded, the grandson is a leaf.
  let tree = build_tree(&s, grandfather.person_id, 2).await.unwrap().unwrap();
  let TreeBranch::Member { node: father_node } = &tree.relations["father"][0]
  else {
    panic!("expected registered member");
  };
  let TreeBranch::Member { node: son_node } =
    &father_node.relations["father"][0]
  else {
    panic!("expected registered member");
  };
  assert_eq!(son_node.person.person_id, son.person_id);
  assert!(son_node.relations.is_empty());
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notification_round_trip() {
  let s = store().await;
  let person = s.add_person(new_person("A", "X", None)).await.unwrap();

  let created = s
    .add_notification(NewNotification {
      person_id: person.person_id,
      message:   "Bar mitzvah in 180 days".into(),
      kind:      NotificationKind::BarMitzvah,
    })
    .await
    .unwrap();
  assert_eq!(created.status, NotificationStatus::Unread);

  let all = s.list_notifications().await.unwrap();
  assert_eq!(all.len(), 1);
  assert_eq!(all[0].kind, NotificationKind::BarMitzvah);
  assert_eq!(all[0].person_id, person.person_id);

  s.delete_notification(created.notification_id).await.unwrap();
  assert!(s.list_notifications().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_missing_notification_errors() {
  let s = store().await;
  let err = s.delete_notification(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::NotificationNotFound(_))
  ));
}
