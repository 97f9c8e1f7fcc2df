//! Family-tree builder — bounded-depth, cycle-safe expansion of a person's
//! relation graph.
//!
//! The builder issues plain sequential reads with no transaction around
//! them: the tree is an advisory display snapshot and may reflect a graph
//! that changes mid-traversal. A single visited-set spans the whole
//! traversal, so any person appears at most once, at the first position
//! the walk discovers them; this trades completeness for guaranteed
//! termination on cyclic graphs (mutual spouse edges being the everyday
//! case).

use std::{
  collections::{BTreeMap, HashSet},
  future::Future,
  pin::Pin,
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  person::PersonSummary,
  relation::{ExternalPersonInfo, RelationRecord, RelationTarget},
  store::RegistryStore,
};

/// Depth used by the HTTP layer when the caller does not pass one.
pub const DEFAULT_DEPTH: u32 = 2;

/// A person plus their expanded relations, keyed by relation-type symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
  pub person:    PersonSummary,
  pub relations: BTreeMap<String, Vec<TreeBranch>>,
}

/// One entry under a relation-type key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeBranch {
  /// A registered person; `node.relations` is empty at the depth limit.
  Member { node: TreeNode },
  /// An inline external relative. Never expanded.
  External {
    info:            ExternalPersonInfo,
    not_in_registry: bool,
  },
}

/// Expand `root`'s relation graph to at most `max_depth` levels.
///
/// Returns `None` when `max_depth` is zero or the root person does not
/// exist.
pub async fn build_tree<S>(
  store: &S,
  root: Uuid,
  max_depth: u32,
) -> Result<Option<TreeNode>, S::Error>
where
  S: RegistryStore,
{
  if max_depth == 0 {
    return Ok(None);
  }
  let mut visited = HashSet::new();
  expand(store, root, max_depth, &mut visited).await
}

/// Recursive step, boxed because async recursion needs an indirection.
fn expand<'a, S>(
  store: &'a S,
  person_id: Uuid,
  remaining: u32,
  visited: &'a mut HashSet<Uuid>,
) -> Pin<Box<dyn Future<Output = Result<Option<TreeNode>, S::Error>> + Send + 'a>>
where
  S: RegistryStore,
{
  Box::pin(async move {
    let Some(person) = store.get_person(person_id).await? else {
      return Ok(None);
    };
    visited.insert(person_id);

    let records = store.list_relations(person_id, true).await?;
    let mut relations: BTreeMap<String, Vec<TreeBranch>> = BTreeMap::new();

    for record in records {
      let RelationRecord { relation, related } = record;
      match relation.target {
        RelationTarget::Registered { person_id: related_id } => {
          if visited.contains(&related_id) {
            continue;
          }
          let branch = if remaining > 1 {
            match expand(store, related_id, remaining - 1, visited).await? {
              Some(node) => TreeBranch::Member { node },
              // The related person vanished between the two reads.
              None => continue,
            }
          } else {
            let Some(summary) = related else { continue };
            visited.insert(related_id);
            TreeBranch::Member {
              node: TreeNode { person: summary, relations: BTreeMap::new() },
            }
          };
          relations
            .entry(relation.relation_type)
            .or_default()
            .push(branch);
        }
        RelationTarget::External { info } => {
          relations
            .entry(relation.relation_type)
            .or_default()
            .push(TreeBranch::External { info, not_in_registry: true });
        }
      }
    }

    Ok(Some(TreeNode { person: person.summary(), relations }))
  })
}
