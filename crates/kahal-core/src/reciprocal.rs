//! Reciprocal inference — computes the reverse relation type for an edge.
//!
//! Pure functions over a catalog entry and the target person's sex, so the
//! same policy applies everywhere a reverse edge is derived. The reverse
//! edge is owned by the target and describes the target, which is why the
//! target's sex (never the acting user's) selects the qualified symbol.

use crate::{catalog::RelationTypeEntry, person::Sex};

/// The male/female pair a base symbol resolves into.
/// Base symbols outside this table (e.g. "wife") pass through unchanged.
fn gender_pair(base: &str) -> Option<(&'static str, &'static str)> {
  match base {
    "child" => Some(("son", "daughter")),
    "parent" => Some(("father", "mother")),
    "sibling" => Some(("brother", "sister")),
    "grandchild" => Some(("grandson", "granddaughter")),
    "grandparent" => Some(("grandfather", "grandmother")),
    "nephew" | "niece" => Some(("nephew", "niece")),
    "uncle" | "aunt" => Some(("uncle", "aunt")),
    "cousin" | "cousin_male" | "cousin_female" => {
      Some(("cousin_male", "cousin_female"))
    }
    _ => None,
  }
}

/// The reverse relation type for an edge of `entry`'s type, qualified by
/// the target's sex.
///
/// Returns `None` when the catalog declares no reciprocal. An unknown sex
/// deterministically yields the unqualified base symbol.
pub fn reverse_symbol(
  entry: &RelationTypeEntry,
  target_sex: Option<Sex>,
) -> Option<String> {
  let base = entry.reciprocal.as_deref()?;

  if entry.gender_specific {
    if let (Some(sex), Some((male, female))) = (target_sex, gender_pair(base)) {
      return Some(
        match sex {
          Sex::Male => male,
          Sex::Female => female,
        }
        .to_owned(),
      );
    }
  }

  Some(base.to_owned())
}

/// Every symbol a reverse edge of `entry`'s type may carry: the base plus
/// its sex-qualified variants. Used to locate the reverse edge when
/// deleting a pair, since the reverse is found by lookup, not by a stored
/// back-reference.
pub fn reciprocal_family(entry: &RelationTypeEntry) -> Vec<String> {
  let Some(base) = entry.reciprocal.as_deref() else {
    return Vec::new();
  };

  let mut family = vec![base.to_owned()];
  if let Some((male, female)) = gender_pair(base) {
    for symbol in [male, female] {
      if symbol != base {
        family.push(symbol.to_owned());
      }
    }
  }
  family
}
