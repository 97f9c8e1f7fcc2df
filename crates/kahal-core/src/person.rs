//! Person — a registered member of the community directory.
//!
//! The directory owns the derived fields (`age`, `hebrew_birth_date`): they
//! are recomputed by the store whenever the birth date changes and by the
//! nightly refresh job, never accepted from callers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Recorded sex; drives gender-specific reciprocal relation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
  Male,
  Female,
}

/// A structured street address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub city:      Option<String>,
  pub street:    Option<String>,
  pub house:     Option<String>,
  pub apartment: Option<String>,
}

/// Religious-observance flags kept on the person record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReligiousInfo {
  #[serde(default)]
  pub shabbat_observant: bool,
  #[serde(default)]
  pub keeps_kosher:      bool,
  pub synagogue:         Option<String>,
  pub community_role:    Option<String>,
}

/// A registered individual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:         Uuid,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  pub first_name:        String,
  pub last_name:         String,
  /// Patronymic.
  pub father_name:       Option<String>,
  pub birth_date:        Option<NaiveDate>,
  /// Derived Hebrew-calendar label for the birth date, e.g. "20 Tevet 5784".
  pub hebrew_birth_date: Option<String>,
  /// Derived from `birth_date`.
  pub age:               Option<u32>,
  pub sex:               Option<Sex>,
  pub mobile_number:     Option<String>,
  pub email:             Option<String>,
  pub address:           Option<Address>,
  pub religious_info:    Option<ReligiousInfo>,
  pub notes:             Option<String>,
}

impl Person {
  /// The public fields exposed when a relation or tree node is enriched.
  pub fn summary(&self) -> PersonSummary {
    PersonSummary {
      person_id:         self.person_id,
      first_name:        self.first_name.clone(),
      last_name:         self.last_name.clone(),
      father_name:       self.father_name.clone(),
      birth_date:        self.birth_date,
      hebrew_birth_date: self.hebrew_birth_date.clone(),
      sex:               self.sex,
      mobile_number:     self.mobile_number.clone(),
      email:             self.email.clone(),
    }
  }

  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// Input to [`crate::store::RegistryStore::add_person`].
/// Derived fields are always computed by the store; they are not accepted
/// from callers.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
  pub first_name:     String,
  pub last_name:      String,
  pub father_name:    Option<String>,
  pub birth_date:     Option<NaiveDate>,
  pub sex:            Option<Sex>,
  pub mobile_number:  Option<String>,
  pub email:          Option<String>,
  pub address:        Option<Address>,
  pub religious_info: Option<ReligiousInfo>,
  pub notes:          Option<String>,
}

/// Full-record replacement for [`crate::store::RegistryStore::update_person`].
/// Every stored field takes the submitted value; derived fields are
/// recomputed from the new birth date.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonUpdate {
  pub first_name:     String,
  pub last_name:      String,
  pub father_name:    Option<String>,
  pub birth_date:     Option<NaiveDate>,
  pub sex:            Option<Sex>,
  pub mobile_number:  Option<String>,
  pub email:          Option<String>,
  pub address:        Option<Address>,
  pub religious_info: Option<ReligiousInfo>,
  pub notes:          Option<String>,
}

/// The public slice of a person record used to enrich relation listings and
/// family-tree nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
  pub person_id:         Uuid,
  pub first_name:        String,
  pub last_name:         String,
  pub father_name:       Option<String>,
  pub birth_date:        Option<NaiveDate>,
  pub hebrew_birth_date: Option<String>,
  pub sex:               Option<Sex>,
  pub mobile_number:     Option<String>,
  pub email:             Option<String>,
}

/// Parameters for [`crate::store::RegistryStore::search_persons`].
///
/// Name filters are case-insensitive substring matches; a birth date
/// widens to a ±2-year window rather than matching exactly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonQuery {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub birth_date: Option<NaiveDate>,
}
