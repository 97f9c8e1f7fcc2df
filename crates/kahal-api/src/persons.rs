//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`    | `/persons` | Full directory listing |
//! | `POST`   | `/persons` | Body: [`NewPerson`]; returns 201 |
//! | `GET`    | `/persons/:id` | 404 if not found |
//! | `PUT`    | `/persons/:id` | Body: [`PersonUpdate`]; full replacement |
//! | `DELETE` | `/persons/:id` | Inbound edges become external stubs |
//! | `POST`   | `/persons/search` | Body: [`PersonQuery`]; fuzzy match |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kahal_core::{
  person::{NewPerson, Person, PersonQuery, PersonUpdate},
  store::RegistryStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /persons`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: RegistryStore,
{
  let persons = store
    .list_persons()
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(persons))
}

/// `POST /persons` — returns 201 + the stored [`Person`].
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
{
  let person = store
    .add_person(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(person)))
}

/// `GET /persons/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore,
{
  let person = store
    .get_person(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

/// `PUT /persons/:id` — full-record replacement; derived fields are
/// recomputed from the submitted birth date.
pub async fn update_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<PersonUpdate>,
) -> Result<Json<Person>, ApiError>
where
  S: RegistryStore,
{
  let person = store
    .update_person(id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(person))
}

/// `DELETE /persons/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RegistryStore,
{
  store
    .delete_person(id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /persons/search` — body: [`PersonQuery`].
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Json(query): Json<PersonQuery>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: RegistryStore,
{
  let persons = store
    .search_persons(&query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(persons))
}
