//! [`SqliteStore`] — the SQLite implementation of
//! [`RegistryStore`](kahal_core::store::RegistryStore).
//!
//! Relation mutations are multi-step (existence checks, duplicate scan,
//! forward edge, derived reverse edge); each runs inside one SQLite
//! transaction so a partially-written edge pair is never observable.

use std::path::Path;

use chrono::{Datelike, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kahal_core::{
  Error as CoreError,
  catalog::{RelationTypeEntry, SEED},
  notification::{NewNotification, Notification},
  person::{NewPerson, Person, PersonQuery, PersonUpdate, Sex},
  reciprocal::{reciprocal_family, reverse_symbol},
  relation::{
    DuplicateCandidate, DuplicateProbe, NewRelation, Relation, RelationRecord,
    RelationTarget,
  },
  store::RegistryStore,
};

use crate::{
  Error, Result,
  encode::{
    RawNotification, RawPerson, RawPersonSummary, RawRelation, encode_day,
    encode_dt, encode_json, encode_notification_kind,
    encode_notification_status, encode_sex, encode_uuid,
  },
  schema::SCHEMA,
};

const PERSON_COLS: &str = "person_id, created_at, updated_at, first_name, \
  last_name, father_name, birth_date, hebrew_birth_date, age, sex, \
  mobile_number, email, address, religious_info, notes";

const RELATION_COLS: &str = "relation_id, owner_id, related_person_id, \
  external_info, relation_type, notes, created_at, updated_at";

/// Notes attached to edges the store derives on its own.
const REVERSE_NOTE: &str = "created automatically as the reciprocal edge";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kahal registry backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers (run inside `conn.call` closures) ───────────────────────────

fn raw_person(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPerson> {
  Ok(RawPerson {
    person_id:         row.get(0)?,
    created_at:        row.get(1)?,
    updated_at:        row.get(2)?,
    first_name:        row.get(3)?,
    last_name:         row.get(4)?,
    father_name:       row.get(5)?,
    birth_date:        row.get(6)?,
    hebrew_birth_date: row.get(7)?,
    age:               row.get(8)?,
    sex:               row.get(9)?,
    mobile_number:     row.get(10)?,
    email:             row.get(11)?,
    address:           row.get(12)?,
    religious_info:    row.get(13)?,
    notes:             row.get(14)?,
  })
}

fn raw_relation(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRelation> {
  Ok(RawRelation {
    relation_id:       row.get(0)?,
    owner_id:          row.get(1)?,
    related_person_id: row.get(2)?,
    external_info:     row.get(3)?,
    relation_type:     row.get(4)?,
    notes:             row.get(5)?,
    created_at:        row.get(6)?,
    updated_at:        row.get(7)?,
  })
}

fn person_exists(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM persons WHERE person_id = ?1",
        rusqlite::params![encode_uuid(id)],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Outer `None`: no such person. Inner `None`: sex not recorded.
fn person_sex(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> rusqlite::Result<Option<Option<Sex>>> {
  let row: Option<Option<String>> = conn
    .query_row(
      "SELECT sex FROM persons WHERE person_id = ?1",
      rusqlite::params![encode_uuid(id)],
      |row| row.get(0),
    )
    .optional()?;

  Ok(row.map(|sex| {
    sex.as_deref().and_then(|s| match s {
      "male" => Some(Sex::Male),
      "female" => Some(Sex::Female),
      _ => None,
    })
  }))
}

fn catalog_entry(
  conn: &rusqlite::Connection,
  symbol: &str,
) -> rusqlite::Result<Option<RelationTypeEntry>> {
  conn
    .query_row(
      "SELECT symbol, name_ru, name_he, reciprocal, gender_specific
       FROM relation_types WHERE symbol = ?1",
      rusqlite::params![symbol],
      |row| {
        Ok(RelationTypeEntry {
          symbol:          row.get(0)?,
          name_ru:         row.get(1)?,
          name_he:         row.get(2)?,
          reciprocal:      row.get(3)?,
          gender_specific: row.get(4)?,
        })
      },
    )
    .optional()
}

fn fetch_relation_row(
  conn: &rusqlite::Connection,
  id: Uuid,
) -> rusqlite::Result<Option<RawRelation>> {
  conn
    .query_row(
      &format!("SELECT {RELATION_COLS} FROM relations WHERE relation_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      raw_relation,
    )
    .optional()
}

#[allow(clippy::too_many_arguments)]
fn insert_relation_row(
  conn: &rusqlite::Connection,
  relation_id: Uuid,
  owner_id: Uuid,
  related_person_id: Option<Uuid>,
  external_json: Option<&str>,
  relation_type: &str,
  notes: Option<&str>,
  now: &str,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO relations (
       relation_id, owner_id, related_person_id, external_info,
       relation_type, notes, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    rusqlite::params![
      encode_uuid(relation_id),
      encode_uuid(owner_id),
      related_person_id.map(encode_uuid),
      external_json,
      relation_type,
      notes,
      now,
    ],
  )?;
  Ok(())
}

/// All external-target edges whose inline info matches the probe, with the
/// owning person's display name. Rows with undecodable info are skipped:
/// the duplicate check fails open.
fn scan_external_duplicates(
  conn: &rusqlite::Connection,
  probe: &DuplicateProbe,
) -> rusqlite::Result<Vec<DuplicateCandidate>> {
  let mut stmt = conn.prepare(
    "SELECT r.relation_id, r.owner_id, r.external_info,
            p.first_name, p.last_name
     FROM relations r
     JOIN persons p ON p.person_id = r.owner_id
     WHERE r.external_info IS NOT NULL",
  )?;

  let rows = stmt
    .query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
      ))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut candidates = Vec::new();
  for (relation_id, owner_id, info_json, first, last) in rows {
    let Ok(info) = serde_json::from_str(&info_json) else { continue };
    if !probe.matches(&info) {
      continue;
    }
    let (Ok(relation_id), Ok(owner_id)) =
      (Uuid::parse_str(&relation_id), Uuid::parse_str(&owner_id))
    else {
      continue;
    };
    candidates.push(DuplicateCandidate {
      relation_id,
      owner_id,
      owner_name: format!("{first} {last}"),
      info,
    });
  }
  Ok(candidates)
}

/// `?N` placeholders for the reverse-family `IN` clause, starting at ?3.
fn family_placeholders(len: usize) -> String {
  (3..3 + len)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn reverse_edge_exists(
  conn: &rusqlite::Connection,
  owner_id: Uuid,
  related_id: Uuid,
  family: &[String],
) -> rusqlite::Result<bool> {
  let sql = format!(
    "SELECT 1 FROM relations
     WHERE owner_id = ?1 AND related_person_id = ?2
       AND relation_type IN ({}) LIMIT 1",
    family_placeholders(family.len())
  );
  let mut values = vec![encode_uuid(owner_id), encode_uuid(related_id)];
  values.extend(family.iter().cloned());

  Ok(
    conn
      .query_row(&sql, rusqlite::params_from_iter(values), |_| Ok(true))
      .optional()?
      .unwrap_or(false),
  )
}

fn delete_reverse_edges(
  conn: &rusqlite::Connection,
  owner_id: Uuid,
  related_id: Uuid,
  family: &[String],
) -> rusqlite::Result<usize> {
  let sql = format!(
    "DELETE FROM relations
     WHERE owner_id = ?1 AND related_person_id = ?2
       AND relation_type IN ({})",
    family_placeholders(family.len())
  );
  let mut values = vec![encode_uuid(owner_id), encode_uuid(related_id)];
  values.extend(family.iter().cloned());
  conn.execute(&sql, rusqlite::params_from_iter(values))
}

// ─── Derived fields ──────────────────────────────────────────────────────────

fn derived_fields(
  birth: Option<NaiveDate>,
  today: NaiveDate,
) -> Result<(Option<u32>, Option<String>)> {
  match birth {
    Some(birth) => Ok((
      Some(kahal_hebrew::age_on(birth, today)),
      Some(kahal_hebrew::hebrew_label(birth)?),
    )),
    None => Ok((None, None)),
  }
}

/// Shift a calendar date by whole years; February 29th falls back to
/// March 1st.
fn shift_years(date: NaiveDate, years: i32) -> NaiveDate {
  let year = date.year() + years;
  NaiveDate::from_ymd_opt(year, date.month(), date.day())
    .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
    .unwrap_or(date)
}

// ─── RegistryStore impl ──────────────────────────────────────────────────────

impl RegistryStore for SqliteStore {
  type Error = Error;

  // ── Person directory ──────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let now = Utc::now();
    let (age, hebrew_birth_date) =
      derived_fields(input.birth_date, now.date_naive())?;

    let person = Person {
      person_id: Uuid::new_v4(),
      created_at: now,
      updated_at: now,
      first_name: input.first_name,
      last_name: input.last_name,
      father_name: input.father_name,
      birth_date: input.birth_date,
      hebrew_birth_date,
      age,
      sex: input.sex,
      mobile_number: input.mobile_number,
      email: input.email,
      address: input.address,
      religious_info: input.religious_info,
      notes: input.notes,
    };

    let id_str         = encode_uuid(person.person_id);
    let at_str         = encode_dt(now);
    let first_name     = person.first_name.clone();
    let last_name      = person.last_name.clone();
    let father_name    = person.father_name.clone();
    let birth_str      = person.birth_date.map(encode_day);
    let hebrew_str     = person.hebrew_birth_date.clone();
    let age_val        = person.age.map(i64::from);
    let sex_str        = person.sex.map(encode_sex);
    let mobile         = person.mobile_number.clone();
    let email          = person.email.clone();
    let address_json   = person.address.as_ref().map(encode_json).transpose()?;
    let religious_json =
      person.religious_info.as_ref().map(encode_json).transpose()?;
    let notes = person.notes.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO persons (
             person_id, created_at, updated_at, first_name, last_name,
             father_name, birth_date, hebrew_birth_date, age, sex,
             mobile_number, email, address, religious_info, notes
           ) VALUES (?1, ?2, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            id_str,
            at_str,
            first_name,
            last_name,
            father_name,
            birth_str,
            hebrew_str,
            age_val,
            sex_str,
            mobile,
            email,
            address_json,
            religious_json,
            notes,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLS} FROM persons WHERE person_id = ?1"),
              rusqlite::params![id_str],
              raw_person,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLS} FROM persons ORDER BY last_name, first_name"
        ))?;
        let rows = stmt
          .query_map([], raw_person)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn update_person(
    &self,
    id: Uuid,
    update: PersonUpdate,
  ) -> Result<Person> {
    let now = Utc::now();
    let (age, hebrew_birth_date) =
      derived_fields(update.birth_date, now.date_naive())?;

    let id_str         = encode_uuid(id);
    let at_str         = encode_dt(now);
    let first_name     = update.first_name.clone();
    let last_name      = update.last_name.clone();
    let father_name    = update.father_name.clone();
    let birth_str      = update.birth_date.map(encode_day);
    let hebrew_str     = hebrew_birth_date.clone();
    let age_val        = age.map(i64::from);
    let sex_str        = update.sex.map(encode_sex);
    let mobile         = update.mobile_number.clone();
    let email          = update.email.clone();
    let address_json   = update.address.as_ref().map(encode_json).transpose()?;
    let religious_json =
      update.religious_info.as_ref().map(encode_json).transpose()?;
    let notes = update.notes.clone();

    let created_at: std::result::Result<String, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let created: Option<String> = tx
          .query_row(
            "SELECT created_at FROM persons WHERE person_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;
        let Some(created) = created else {
          return Ok(Err(CoreError::PersonNotFound(id)));
        };

        tx.execute(
          "UPDATE persons SET
             updated_at = ?2, first_name = ?3, last_name = ?4,
             father_name = ?5, birth_date = ?6, hebrew_birth_date = ?7,
             age = ?8, sex = ?9, mobile_number = ?10, email = ?11,
             address = ?12, religious_info = ?13, notes = ?14
           WHERE person_id = ?1",
          rusqlite::params![
            id_str,
            at_str,
            first_name,
            last_name,
            father_name,
            birth_str,
            hebrew_str,
            age_val,
            sex_str,
            mobile,
            email,
            address_json,
            religious_json,
            notes,
          ],
        )?;

        tx.commit()?;
        Ok(Ok(created))
      })
      .await?;

    let created_at = crate::encode::decode_dt(&created_at?)?;

    Ok(Person {
      person_id: id,
      created_at,
      updated_at: now,
      first_name: update.first_name,
      last_name: update.last_name,
      father_name: update.father_name,
      birth_date: update.birth_date,
      hebrew_birth_date,
      age,
      sex: update.sex,
      mobile_number: update.mobile_number,
      email: update.email,
      address: update.address,
      religious_info: update.religious_info,
      notes: update.notes,
    })
  }

  async fn delete_person(&self, id: Uuid) -> Result<()> {
    let id_str  = encode_uuid(id);
    let now_str = encode_dt(Utc::now());

    let outcome: std::result::Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        struct StubSource {
          first_name:        String,
          last_name:         String,
          father_name:       Option<String>,
          birth_date:        Option<String>,
          hebrew_birth_date: Option<String>,
          sex:               Option<String>,
          mobile_number:     Option<String>,
          email:             Option<String>,
        }

        let source: Option<StubSource> = tx
          .query_row(
            "SELECT first_name, last_name, father_name, birth_date,
                    hebrew_birth_date, sex, mobile_number, email
             FROM persons WHERE person_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(StubSource {
                first_name:        row.get(0)?,
                last_name:         row.get(1)?,
                father_name:       row.get(2)?,
                birth_date:        row.get(3)?,
                hebrew_birth_date: row.get(4)?,
                sex:               row.get(5)?,
                mobile_number:     row.get(6)?,
                email:             row.get(7)?,
              })
            },
          )
          .optional()?;
        let Some(source) = source else {
          return Ok(Err(CoreError::PersonNotFound(id)));
        };

        // Inbound edges keep their history as external stubs.
        let stub = serde_json::json!({
          "first_name":    source.first_name,
          "last_name":     source.last_name,
          "father_name":   source.father_name,
          "birth_date":    source.birth_date,
          "hebrew_date":   source.hebrew_birth_date,
          "sex":           source.sex,
          "mobile_number": source.mobile_number,
          "email":         source.email,
          "is_deceased":   false,
        })
        .to_string();

        let converted = tx.execute(
          "UPDATE relations
           SET related_person_id = NULL, external_info = ?1, updated_at = ?2
           WHERE related_person_id = ?3",
          rusqlite::params![stub, now_str, id_str],
        )?;
        tracing::debug!(converted, "inbound edges rewritten to external stubs");

        tx.execute(
          "DELETE FROM relations WHERE owner_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM persons WHERE person_id = ?1",
          rusqlite::params![id_str],
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    Ok(outcome?)
  }

  async fn search_persons(&self, query: &PersonQuery) -> Result<Vec<Person>> {
    let first_pat = query
      .first_name
      .as_deref()
      .map(|s| format!("%{}%", s.to_lowercase()));
    let last_pat = query
      .last_name
      .as_deref()
      .map(|s| format!("%{}%", s.to_lowercase()));
    // A supplied birth date widens to a ±2-year window.
    let (start, end) = match query.birth_date {
      Some(date) => (
        Some(encode_day(shift_years(date, -2))),
        Some(encode_day(shift_years(date, 2))),
      ),
      None => (None, None),
    };

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        // Build the WHERE clause with one positional value per condition.
        let mut conds: Vec<&'static str> = vec![];
        let mut values: Vec<String> = vec![];
        if let Some(pat) = first_pat {
          conds.push("lower(first_name) LIKE ?");
          values.push(pat);
        }
        if let Some(pat) = last_pat {
          conds.push("lower(last_name) LIKE ?");
          values.push(pat);
        }
        if let (Some(start), Some(end)) = (start, end) {
          conds.push("birth_date BETWEEN ? AND ?");
          values.push(start);
          values.push(end);
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {PERSON_COLS} FROM persons
           {where_clause}
           ORDER BY last_name, first_name
           LIMIT 20"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), raw_person)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn refresh_derived(&self, today: NaiveDate) -> Result<usize> {
    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let rows: Vec<(String, String)> = {
          let mut stmt = tx.prepare(
            "SELECT person_id, birth_date FROM persons
             WHERE birth_date IS NOT NULL",
          )?;
          stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut updated = 0usize;
        for (person_id, birth_str) in rows {
          let Ok(birth) = NaiveDate::parse_from_str(&birth_str, "%Y-%m-%d")
          else {
            tracing::warn!(%person_id, "unparsable birth date; skipping");
            continue;
          };
          let Ok(label) = kahal_hebrew::hebrew_label(birth) else {
            tracing::warn!(%person_id, "birth date out of calendar range");
            continue;
          };
          let age = kahal_hebrew::age_on(birth, today);

          tx.execute(
            "UPDATE persons SET age = ?1, hebrew_birth_date = ?2
             WHERE person_id = ?3",
            rusqlite::params![i64::from(age), label, person_id],
          )?;
          updated += 1;
        }

        tx.commit()?;
        Ok(updated)
      })
      .await?;

    Ok(updated)
  }

  // ── Relation-type catalog ─────────────────────────────────────────────────

  async fn ensure_seeded(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        for row in SEED {
          tx.execute(
            "INSERT OR IGNORE INTO relation_types
               (symbol, name_ru, name_he, reciprocal, gender_specific)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              row.symbol,
              row.name_ru,
              row.name_he,
              row.reciprocal,
              true,
            ],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_relation_types(&self) -> Result<Vec<RelationTypeEntry>> {
    let entries = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT symbol, name_ru, name_he, reciprocal, gender_specific
           FROM relation_types ORDER BY name_ru",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RelationTypeEntry {
              symbol:          row.get(0)?,
              name_ru:         row.get(1)?,
              name_he:         row.get(2)?,
              reciprocal:      row.get(3)?,
              gender_specific: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(entries)
  }

  async fn get_relation_type(
    &self,
    symbol: &str,
  ) -> Result<Option<RelationTypeEntry>> {
    let symbol = symbol.to_owned();
    let entry = self
      .conn
      .call(move |conn| Ok(catalog_entry(conn, &symbol)?))
      .await?;
    Ok(entry)
  }

  // ── Relation graph ────────────────────────────────────────────────────────

  async fn create_relation(&self, input: NewRelation) -> Result<Relation> {
    let now = Utc::now();

    // Validate and encode the target before any database work.
    let (related_uuid, external_json) = match &input.target {
      RelationTarget::Registered { person_id } => (Some(*person_id), None),
      RelationTarget::External { info } => {
        if !info.has_name() {
          return Err(CoreError::MissingExternalName.into());
        }
        (None, Some(encode_json(info)?))
      }
    };
    let probe = match &input.target {
      RelationTarget::External { info } if input.check_duplicates => {
        Some(DuplicateProbe::from_external(info))
      }
      _ => None,
    };

    let relation = Relation {
      relation_id:   Uuid::new_v4(),
      owner_id:      input.owner_id,
      target:        input.target,
      relation_type: input.relation_type,
      notes:         input.notes,
      created_at:    now,
      updated_at:    now,
    };

    let forward_id     = relation.relation_id;
    let reverse_id     = Uuid::new_v4();
    let owner_id       = relation.owner_id;
    let type_symbol    = relation.relation_type.clone();
    let notes          = relation.notes.clone();
    let now_str        = encode_dt(now);
    let create_reverse = input.create_reverse;

    let outcome: std::result::Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !person_exists(&tx, owner_id)? {
          return Ok(Err(CoreError::PersonNotFound(owner_id)));
        }
        let Some(entry) = catalog_entry(&tx, &type_symbol)? else {
          return Ok(Err(CoreError::RelationTypeNotFound(type_symbol)));
        };

        let mut target_sex = None;
        if let Some(related_id) = related_uuid {
          match person_sex(&tx, related_id)? {
            Some(sex) => target_sex = sex,
            None => return Ok(Err(CoreError::PersonNotFound(related_id))),
          }
        }

        if let Some(probe) = &probe {
          let candidates = scan_external_duplicates(&tx, probe)?;
          if !candidates.is_empty() {
            return Ok(Err(CoreError::DuplicateExternal { candidates }));
          }
        }

        insert_relation_row(
          &tx,
          forward_id,
          owner_id,
          related_uuid,
          external_json.as_deref(),
          &type_symbol,
          notes.as_deref(),
          &now_str,
        )?;

        if create_reverse
          && let Some(related_id) = related_uuid
          && let Some(reverse) = reverse_symbol(&entry, target_sex)
        {
          insert_relation_row(
            &tx,
            reverse_id,
            related_id,
            Some(owner_id),
            None,
            &reverse,
            Some(REVERSE_NOTE),
            &now_str,
          )?;
          tracing::info!(
            owner = %related_id,
            related = %owner_id,
            relation_type = %reverse,
            "reciprocal edge created"
          );
        }

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome?;
    Ok(relation)
  }

  async fn get_relation(&self, id: Uuid) -> Result<Option<Relation>> {
    let raw = self
      .conn
      .call(move |conn| Ok(fetch_relation_row(conn, id)?))
      .await?;

    raw.map(RawRelation::into_relation).transpose()
  }

  async fn list_relations(
    &self,
    person_id: Uuid,
    include_details: bool,
  ) -> Result<Vec<RelationRecord>> {
    let owner_str = encode_uuid(person_id);

    let rows: Vec<(RawRelation, Option<RawPersonSummary>)> = self
      .conn
      .call(move |conn| {
        if include_details {
          let mut stmt = conn.prepare(
            "SELECT r.relation_id, r.owner_id, r.related_person_id,
                    r.external_info, r.relation_type, r.notes,
                    r.created_at, r.updated_at,
                    p.person_id, p.first_name, p.last_name, p.father_name,
                    p.birth_date, p.hebrew_birth_date, p.sex,
                    p.mobile_number, p.email
             FROM relations r
             LEFT JOIN persons p ON p.person_id = r.related_person_id
             WHERE r.owner_id = ?1
             ORDER BY r.relation_type ASC",
          )?;
          let rows = stmt
            .query_map(rusqlite::params![owner_str], |row| {
              let relation = raw_relation(row)?;
              let summary = match row.get::<_, Option<String>>(8)? {
                Some(person_id) => Some(RawPersonSummary {
                  person_id,
                  first_name:        row.get(9)?,
                  last_name:         row.get(10)?,
                  father_name:       row.get(11)?,
                  birth_date:        row.get(12)?,
                  hebrew_birth_date: row.get(13)?,
                  sex:               row.get(14)?,
                  mobile_number:     row.get(15)?,
                  email:             row.get(16)?,
                }),
                None => None,
              };
              Ok((relation, summary))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RELATION_COLS} FROM relations
             WHERE owner_id = ?1 ORDER BY relation_type ASC"
          ))?;
          let rows = stmt
            .query_map(rusqlite::params![owner_str], |row| {
              Ok((raw_relation(row)?, None))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        }
      })
      .await?;

    rows
      .into_iter()
      .map(|(raw, summary)| {
        Ok(RelationRecord {
          relation: raw.into_relation()?,
          related:  summary.map(RawPersonSummary::into_summary).transpose()?,
        })
      })
      .collect()
  }

  async fn delete_relation(
    &self,
    id: Uuid,
    delete_reverse: bool,
  ) -> Result<()> {
    let outcome: std::result::Result<(), CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(raw) = fetch_relation_row(&tx, id)? else {
          return Ok(Err(CoreError::RelationNotFound(id)));
        };

        // Best-effort: a missing reverse edge or unseeded type never fails
        // the primary removal.
        if delete_reverse
          && let Some(related_str) = &raw.related_person_id
          && let (Ok(related_id), Ok(owner_id)) =
            (Uuid::parse_str(related_str), Uuid::parse_str(&raw.owner_id))
        {
          match catalog_entry(&tx, &raw.relation_type)? {
            Some(entry) => {
              let family = reciprocal_family(&entry);
              if !family.is_empty() {
                let removed =
                  delete_reverse_edges(&tx, related_id, owner_id, &family)?;
                tracing::debug!(removed, "reverse edges removed");
              }
            }
            None => tracing::debug!(
              relation_type = %raw.relation_type,
              "no catalog entry; skipping reverse delete"
            ),
          }
        }

        tx.execute(
          "DELETE FROM relations WHERE relation_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?;

        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    Ok(outcome?)
  }

  async fn link_external_to_registered(
    &self,
    relation_id: Uuid,
    person_id: Uuid,
    create_reverse: bool,
  ) -> Result<Relation> {
    let now = Utc::now();
    let now_str = encode_dt(now);
    let reverse_id = Uuid::new_v4();

    let outcome: std::result::Result<RawRelation, CoreError> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(raw) = fetch_relation_row(&tx, relation_id)? else {
          return Ok(Err(CoreError::RelationNotFound(relation_id)));
        };
        if raw.related_person_id.is_some() {
          return Ok(Err(CoreError::AlreadyLinked(relation_id)));
        }
        let Some(target_sex) = person_sex(&tx, person_id)? else {
          return Ok(Err(CoreError::PersonNotFound(person_id)));
        };

        tx.execute(
          "UPDATE relations
           SET related_person_id = ?1, external_info = NULL, updated_at = ?2
           WHERE relation_id = ?3",
          rusqlite::params![
            encode_uuid(person_id),
            now_str,
            encode_uuid(relation_id),
          ],
        )?;

        if create_reverse
          && let Ok(owner_id) = Uuid::parse_str(&raw.owner_id)
        {
          match catalog_entry(&tx, &raw.relation_type)? {
            Some(entry) => {
              if let Some(reverse) = reverse_symbol(&entry, target_sex) {
                let family = reciprocal_family(&entry);
                if !reverse_edge_exists(&tx, person_id, owner_id, &family)? {
                  insert_relation_row(
                    &tx,
                    reverse_id,
                    person_id,
                    Some(owner_id),
                    None,
                    &reverse,
                    Some(REVERSE_NOTE),
                    &now_str,
                  )?;
                }
              }
            }
            None => tracing::debug!(
              relation_type = %raw.relation_type,
              "no catalog entry; skipping reverse create"
            ),
          }
        }

        tx.commit()?;
        Ok(Ok(raw))
      })
      .await?;

    let raw = outcome?;
    Ok(Relation {
      relation_id,
      owner_id: crate::encode::decode_uuid(&raw.owner_id)?,
      target: RelationTarget::Registered { person_id },
      relation_type: raw.relation_type,
      notes: raw.notes,
      created_at: crate::encode::decode_dt(&raw.created_at)?,
      updated_at: now,
    })
  }

  async fn find_external_duplicates(
    &self,
    probe: &DuplicateProbe,
  ) -> Result<Vec<DuplicateCandidate>> {
    let probe = probe.clone();
    let candidates = self
      .conn
      .call(move |conn| Ok(scan_external_duplicates(conn, &probe)?))
      .await?;
    Ok(candidates)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn add_notification(
    &self,
    input: NewNotification,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      person_id:       input.person_id,
      message:         input.message,
      kind:            input.kind,
      status:          Default::default(),
      created_at:      Utc::now(),
    };

    let id_str     = encode_uuid(notification.notification_id);
    let person_str = encode_uuid(notification.person_id);
    let message    = notification.message.clone();
    let kind_str   = encode_notification_kind(notification.kind);
    let status_str = encode_notification_status(notification.status);
    let at_str     = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications
             (notification_id, person_id, message, kind, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, person_str, message, kind_str, status_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications(&self) -> Result<Vec<Notification>> {
    let raws: Vec<RawNotification> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, person_id, message, kind, status, created_at
           FROM notifications ORDER BY created_at DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawNotification {
              notification_id: row.get(0)?,
              person_id:       row.get(1)?,
              message:         row.get(2)?,
              kind:            row.get(3)?,
              status:          row.get(4)?,
              created_at:      row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn delete_notification(&self, id: Uuid) -> Result<()> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM notifications WHERE notification_id = ?1",
          rusqlite::params![encode_uuid(id)],
        )?)
      })
      .await?;

    if removed == 0 {
      return Err(CoreError::NotificationNotFound(id).into());
    }
    Ok(())
  }
}
