//! Handler for `/dates/today` — the civil date and its Hebrew label.

use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct TodayResponse {
  pub gregorian_date: NaiveDate,
  pub hebrew_date:    String,
}

/// `GET /dates/today`
pub async fn today() -> Result<Json<TodayResponse>, ApiError> {
  let today = Utc::now().date_naive();
  let hebrew_date = kahal_hebrew::hebrew_label(today)
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(TodayResponse { gregorian_date: today, hebrew_date }))
}
