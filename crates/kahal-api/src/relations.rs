//! Handlers for `/relations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/relations/types` | Relation-type catalog |
//! | `POST`   | `/relations` | Body: [`CreateRelationBody`]; 409 on duplicates |
//! | `GET`    | `/relations/person/:id` | Optional `?details=false` |
//! | `GET`    | `/relations/tree/:id` | Optional `?depth=`, default 2 |
//! | `POST`   | `/relations/:id/link` | Body: [`LinkBody`] |
//! | `DELETE` | `/relations/:id` | Optional `?delete_reverse=false` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kahal_core::{
  catalog::RelationTypeEntry,
  relation::{
    ExternalPersonInfo, NewRelation, Relation, RelationRecord, RelationTarget,
  },
  store::RegistryStore,
  tree::{self, TreeNode},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

fn default_true() -> bool { true }

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// `GET /relations/types`
pub async fn types<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<RelationTypeEntry>>, ApiError>
where
  S: RegistryStore,
{
  let entries = store
    .list_relation_types()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(entries))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /relations`. Exactly one of
/// `related_person_id` / `external_info` must be present.
#[derive(Debug, Deserialize)]
pub struct CreateRelationBody {
  pub owner_id:          Uuid,
  pub relation_type:     String,
  pub related_person_id: Option<Uuid>,
  pub external_info:     Option<ExternalPersonInfo>,
  pub notes:             Option<String>,
  #[serde(default = "default_true")]
  pub create_reverse:    bool,
  #[serde(default = "default_true")]
  pub check_duplicates:  bool,
}

/// `POST /relations` — returns 201 + the stored forward edge. A duplicate
/// external relative yields 409 with the candidate matches.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateRelationBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let target =
    RelationTarget::from_parts(body.related_person_id, body.external_info)
      .map_err(ApiError::from_store)?;

  let relation = store
    .create_relation(NewRelation {
      owner_id:         body.owner_id,
      relation_type:    body.relation_type,
      target,
      notes:            body.notes,
      create_reverse:   body.create_reverse,
      check_duplicates: body.check_duplicates,
    })
    .await
    .map_err(ApiError::from_store)?;

  Ok((StatusCode::CREATED, Json(relation)))
}

// ─── List for person ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Enrich registered targets with the related person's public fields.
  /// Default `true`.
  pub details: Option<bool>,
}

/// `GET /relations/person/:id[?details=false]`
pub async fn list_for_person<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RelationRecord>>, ApiError>
where
  S: RegistryStore,
{
  let records = store
    .list_relations(id, params.details.unwrap_or(true))
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(records))
}

// ─── Family tree ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TreeParams {
  pub depth: Option<u32>,
}

/// `GET /relations/tree/:id[?depth=N]` — `null` for an unknown person or a
/// zero depth, mirroring the advisory nature of the snapshot.
pub async fn family_tree<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<TreeParams>,
) -> Result<Json<Option<TreeNode>>, ApiError>
where
  S: RegistryStore,
{
  let depth = params.depth.unwrap_or(tree::DEFAULT_DEPTH);
  let node = tree::build_tree(store.as_ref(), id, depth)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(node))
}

// ─── Link external to registered ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub person_id:      Uuid,
  #[serde(default = "default_true")]
  pub create_reverse: bool,
}

/// `POST /relations/:id/link` — rewrite an external edge to reference a
/// registered person.
pub async fn link<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<LinkBody>,
) -> Result<Json<Relation>, ApiError>
where
  S: RegistryStore,
{
  let relation = store
    .link_external_to_registered(id, body.person_id, body.create_reverse)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(relation))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
  /// Also remove the reciprocal edge, when one exists. Default `true`.
  pub delete_reverse: Option<bool>,
}

/// `DELETE /relations/:id[?delete_reverse=false]`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
{
  store
    .delete_relation(id, params.delete_reverse.unwrap_or(true))
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
