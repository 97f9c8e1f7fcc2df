//! Calendar-driven notifications produced by the scheduled jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What event a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  BarMitzvah,
  BatMitzvah,
  Birthday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
  #[default]
  Unread,
  Read,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub person_id:       Uuid,
  pub message:         String,
  pub kind:            NotificationKind,
  pub status:          NotificationStatus,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::RegistryStore::add_notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub person_id: Uuid,
  pub message:   String,
  pub kind:      NotificationKind,
}
