//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`. Structured fields (address, religious flags, external
//! person info) are stored as compact JSON. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use kahal_core::{
  notification::{Notification, NotificationKind, NotificationStatus},
  person::{Person, PersonSummary, Sex},
  relation::{Relation, RelationTarget},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Timestamps and dates ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_day(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_day(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Sex ─────────────────────────────────────────────────────────────────────

pub fn encode_sex(sex: Sex) -> &'static str {
  match sex {
    Sex::Male => "male",
    Sex::Female => "female",
  }
}

pub fn decode_sex(s: &str) -> Result<Sex> {
  match s {
    "male" => Ok(Sex::Male),
    "female" => Ok(Sex::Female),
    other => Err(Error::Decode(format!("unknown sex: {other:?}"))),
  }
}

// ─── Notification enums ──────────────────────────────────────────────────────

pub fn encode_notification_kind(kind: NotificationKind) -> &'static str {
  match kind {
    NotificationKind::BarMitzvah => "bar_mitzvah",
    NotificationKind::BatMitzvah => "bat_mitzvah",
    NotificationKind::Birthday => "birthday",
  }
}

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  match s {
    "bar_mitzvah" => Ok(NotificationKind::BarMitzvah),
    "bat_mitzvah" => Ok(NotificationKind::BatMitzvah),
    "birthday" => Ok(NotificationKind::Birthday),
    other => Err(Error::Decode(format!("unknown notification kind: {other:?}"))),
  }
}

pub fn encode_notification_status(status: NotificationStatus) -> &'static str {
  match status {
    NotificationStatus::Unread => "unread",
    NotificationStatus::Read => "read",
  }
}

pub fn decode_notification_status(s: &str) -> Result<NotificationStatus> {
  match s {
    "unread" => Ok(NotificationStatus::Unread),
    "read" => Ok(NotificationStatus::Read),
    other => {
      Err(Error::Decode(format!("unknown notification status: {other:?}")))
    }
  }
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:         String,
  pub created_at:        String,
  pub updated_at:        String,
  pub first_name:        String,
  pub last_name:         String,
  pub father_name:       Option<String>,
  pub birth_date:        Option<String>,
  pub hebrew_birth_date: Option<String>,
  pub age:               Option<i64>,
  pub sex:               Option<String>,
  pub mobile_number:     Option<String>,
  pub email:             Option<String>,
  pub address:           Option<String>,
  pub religious_info:    Option<String>,
  pub notes:             Option<String>,
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:         decode_uuid(&self.person_id)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
      first_name:        self.first_name,
      last_name:         self.last_name,
      father_name:       self.father_name,
      birth_date:        self.birth_date.as_deref().map(decode_day).transpose()?,
      hebrew_birth_date: self.hebrew_birth_date,
      age:               self.age.map(|a| a.max(0) as u32),
      sex:               self.sex.as_deref().map(decode_sex).transpose()?,
      mobile_number:     self.mobile_number,
      email:             self.email,
      address:           self.address.as_deref().map(decode_json).transpose()?,
      religious_info:    self
        .religious_info
        .as_deref()
        .map(decode_json)
        .transpose()?,
      notes:             self.notes,
    })
  }
}

/// Raw strings read directly from a `relations` row.
pub struct RawRelation {
  pub relation_id:       String,
  pub owner_id:          String,
  pub related_person_id: Option<String>,
  pub external_info:     Option<String>,
  pub relation_type:     String,
  pub notes:             Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawRelation {
  pub fn into_relation(self) -> Result<Relation> {
    let target = match (&self.related_person_id, &self.external_info) {
      (Some(id), _) => RelationTarget::Registered {
        person_id: decode_uuid(id)?,
      },
      (None, Some(json)) => RelationTarget::External {
        info: decode_json(json)?,
      },
      // Unreachable while the schema CHECK holds.
      (None, None) => {
        return Err(Error::Decode(format!(
          "relation {} has no target",
          self.relation_id
        )));
      }
    };

    Ok(Relation {
      relation_id:   decode_uuid(&self.relation_id)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      target,
      relation_type: self.relation_type,
      notes:         self.notes,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings for the related person's public fields joined onto a
/// relation row.
pub struct RawPersonSummary {
  pub person_id:         String,
  pub first_name:        String,
  pub last_name:         String,
  pub father_name:       Option<String>,
  pub birth_date:        Option<String>,
  pub hebrew_birth_date: Option<String>,
  pub sex:               Option<String>,
  pub mobile_number:     Option<String>,
  pub email:             Option<String>,
}

impl RawPersonSummary {
  pub fn into_summary(self) -> Result<PersonSummary> {
    Ok(PersonSummary {
      person_id:         decode_uuid(&self.person_id)?,
      first_name:        self.first_name,
      last_name:         self.last_name,
      father_name:       self.father_name,
      birth_date:        self.birth_date.as_deref().map(decode_day).transpose()?,
      hebrew_birth_date: self.hebrew_birth_date,
      sex:               self.sex.as_deref().map(decode_sex).transpose()?,
      mobile_number:     self.mobile_number,
      email:             self.email,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub person_id:       String,
  pub message:         String,
  pub kind:            String,
  pub status:          String,
  pub created_at:      String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      person_id:       decode_uuid(&self.person_id)?,
      message:         self.message,
      kind:            decode_notification_kind(&self.kind)?,
      status:          decode_notification_status(&self.status)?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
