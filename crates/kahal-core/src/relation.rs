//! Relation — a directed, typed edge of the family graph.
//!
//! An edge points from its owning person either at another registered
//! person or at an inline record for a relative who is not in the
//! directory. The two cases are an enum, so an edge with both targets or
//! neither is unrepresentable once the input has been validated.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  person::{PersonSummary, Sex},
};

// ─── External person ─────────────────────────────────────────────────────────

/// Inline record for a relative who is not registered in the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalPersonInfo {
  pub first_name:    Option<String>,
  pub last_name:     Option<String>,
  pub father_name:   Option<String>,
  pub birth_date:    Option<NaiveDate>,
  pub hebrew_date:   Option<String>,
  pub sex:           Option<Sex>,
  pub mobile_number: Option<String>,
  pub email:         Option<String>,
  pub notes:         Option<String>,
  #[serde(default)]
  pub is_deceased:   bool,
  pub deceased_date: Option<NaiveDate>,
}

impl ExternalPersonInfo {
  /// Both name fields present and non-empty.
  pub fn has_name(&self) -> bool {
    let filled = |s: &Option<String>| {
      s.as_deref().is_some_and(|v| !v.trim().is_empty())
    };
    filled(&self.first_name) && filled(&self.last_name)
  }
}

// ─── Target ──────────────────────────────────────────────────────────────────

/// Who the edge points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationTarget {
  Registered { person_id: Uuid },
  External { info: ExternalPersonInfo },
}

impl RelationTarget {
  /// Validate the two optional wire fields into a target.
  /// Exactly one must be present.
  pub fn from_parts(
    related_person_id: Option<Uuid>,
    external_info: Option<ExternalPersonInfo>,
  ) -> Result<Self> {
    match (related_person_id, external_info) {
      (Some(id), None) => Ok(Self::Registered { person_id: id }),
      (None, Some(info)) => Ok(Self::External { info }),
      _ => Err(Error::InvalidTarget),
    }
  }

  pub fn registered_id(&self) -> Option<Uuid> {
    match self {
      Self::Registered { person_id } => Some(*person_id),
      Self::External { .. } => None,
    }
  }
}

// ─── Relation ────────────────────────────────────────────────────────────────

/// A persisted edge. The type symbol describes the owning person's role
/// toward the target ("father" on an edge means the owner is the target's
/// father).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
  pub relation_id:   Uuid,
  pub owner_id:      Uuid,
  pub target:        RelationTarget,
  pub relation_type: String,
  pub notes:         Option<String>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::RegistryStore::create_relation`].
#[derive(Debug, Clone)]
pub struct NewRelation {
  pub owner_id:         Uuid,
  pub relation_type:    String,
  pub target:           RelationTarget,
  pub notes:            Option<String>,
  /// Also persist the gender-corrected reverse edge when the target is a
  /// registered person.
  pub create_reverse:   bool,
  /// Consult the duplicate resolver before inserting an external target.
  pub check_duplicates: bool,
}

/// A relation plus, when requested and the target is registered, the
/// related person's public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationRecord {
  pub relation: Relation,
  pub related:  Option<PersonSummary>,
}

// ─── Duplicate detection ─────────────────────────────────────────────────────

/// An existing external-relative record that plausibly matches a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateCandidate {
  pub relation_id: Uuid,
  pub owner_id:    Uuid,
  /// Display name of the person who owns the matching edge.
  pub owner_name:  String,
  pub info:        ExternalPersonInfo,
}

/// Probe for the duplicate resolver. Missing name fields make the search
/// fail open (empty result), never error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateProbe {
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub birth_date: Option<NaiveDate>,
}

impl DuplicateProbe {
  pub fn from_external(info: &ExternalPersonInfo) -> Self {
    Self {
      first_name: info.first_name.clone(),
      last_name:  info.last_name.clone(),
      birth_date: info.birth_date,
    }
  }

  /// Case-insensitive given+family equality, optionally narrowed by birth
  /// date. A probe without both names matches nothing.
  pub fn matches(&self, info: &ExternalPersonInfo) -> bool {
    let (Some(first), Some(last)) =
      (self.first_name.as_deref(), self.last_name.as_deref())
    else {
      return false;
    };
    if first.trim().is_empty() || last.trim().is_empty() {
      return false;
    }

    let eq_ci = |probe: &str, field: &Option<String>| {
      field
        .as_deref()
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(probe.trim()))
    };
    if !eq_ci(first, &info.first_name) || !eq_ci(last, &info.last_name) {
      return false;
    }

    match self.birth_date {
      Some(probe_date) => info.birth_date == Some(probe_date),
      None => true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn external(first: &str, last: &str) -> ExternalPersonInfo {
    ExternalPersonInfo {
      first_name: Some(first.into()),
      last_name: Some(last.into()),
      ..Default::default()
    }
  }

  #[test]
  fn target_requires_exactly_one_side() {
    let id = Uuid::new_v4();
    assert!(RelationTarget::from_parts(Some(id), None).is_ok());
    assert!(RelationTarget::from_parts(None, Some(external("a", "b"))).is_ok());

    assert!(matches!(
      RelationTarget::from_parts(None, None),
      Err(Error::InvalidTarget)
    ));
    assert!(matches!(
      RelationTarget::from_parts(Some(id), Some(external("a", "b"))),
      Err(Error::InvalidTarget)
    ));
  }

  #[test]
  fn probe_matches_case_insensitively() {
    let probe = DuplicateProbe {
      first_name: Some("Moshe".into()),
      last_name: Some("Katz".into()),
      birth_date: None,
    };
    assert!(probe.matches(&external("moshe", "KATZ")));
    assert!(!probe.matches(&external("Moshe", "Levi")));
  }

  #[test]
  fn probe_birth_date_narrows_the_match() {
    let date = NaiveDate::from_ymd_opt(1990, 5, 1).unwrap();
    let probe = DuplicateProbe {
      first_name: Some("Moshe".into()),
      last_name: Some("Katz".into()),
      birth_date: Some(date),
    };

    let mut info = external("Moshe", "Katz");
    assert!(!probe.matches(&info));
    info.birth_date = Some(date);
    assert!(probe.matches(&info));
  }

  #[test]
  fn probe_without_names_matches_nothing() {
    let probe = DuplicateProbe::default();
    assert!(!probe.matches(&external("Moshe", "Katz")));

    let blank = DuplicateProbe {
      first_name: Some("  ".into()),
      last_name: Some("Katz".into()),
      birth_date: None,
    };
    assert!(!blank.matches(&external("Moshe", "Katz")));
  }
}
