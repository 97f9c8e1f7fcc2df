//! Daily background jobs: derived-field refresh and calendar-event
//! notifications.
//!
//! The jobs operate on the person directory only; they never touch the
//! relation graph. Failures are logged and the loop keeps running.

use std::{sync::Arc, time::Duration};

use chrono::{Datelike, NaiveDate, Utc};
use kahal_core::{
  notification::{NewNotification, NotificationKind},
  person::Sex,
  store::RegistryStore,
};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Run the daily jobs forever. The first pass happens immediately on
/// startup, then once per day.
pub async fn run<S>(store: Arc<S>, lead_days: i64)
where
  S: RegistryStore + 'static,
{
  let mut ticker = tokio::time::interval(DAY);
  ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

  loop {
    ticker.tick().await;
    let today = Utc::now().date_naive();
    run_once(store.as_ref(), today, lead_days).await;
  }
}

/// One pass of both jobs for the given day.
pub async fn run_once<S>(store: &S, today: NaiveDate, lead_days: i64)
where
  S: RegistryStore,
{
  match store.refresh_derived(today).await {
    Ok(updated) => tracing::info!(updated, "derived fields refreshed"),
    Err(e) => tracing::error!(error = %e, "derived-field refresh failed"),
  }

  if let Err(e) = scan_events(store, today, lead_days).await {
    tracing::error!(error = %e, "calendar-event scan failed");
  }
}

/// Create notifications for birthdays falling today and for coming-of-age
/// dates exactly `lead_days` ahead.
async fn scan_events<S>(
  store: &S,
  today: NaiveDate,
  lead_days: i64,
) -> Result<(), S::Error>
where
  S: RegistryStore,
{
  let persons = store.list_persons().await?;
  let mut created = 0usize;

  for person in persons {
    let Some(birth) = person.birth_date else { continue };

    if (birth.month(), birth.day()) == (today.month(), today.day()) {
      store
        .add_notification(NewNotification {
          person_id: person.person_id,
          message:   format!("{}: birthday today", person.full_name()),
          kind:      NotificationKind::Birthday,
        })
        .await?;
      created += 1;
    }

    if let Some(sex) = person.sex
      && let Some(coming_of_age) = kahal_hebrew::coming_of_age_date(birth, sex)
      && (coming_of_age - today).num_days() == lead_days
    {
      let (kind, label) = match sex {
        Sex::Male => (NotificationKind::BarMitzvah, "bar mitzvah"),
        Sex::Female => (NotificationKind::BatMitzvah, "bat mitzvah"),
      };
      store
        .add_notification(NewNotification {
          person_id: person.person_id,
          message:   format!(
            "{}: {label} in {lead_days} days",
            person.full_name()
          ),
          kind,
        })
        .await?;
      created += 1;
    }
  }

  tracing::info!(created, "calendar-event notifications created");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use kahal_core::person::NewPerson;
  use kahal_store_sqlite::SqliteStore;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn person(first: &str, birth: NaiveDate, sex: Option<Sex>) -> NewPerson {
    NewPerson {
      first_name: first.into(),
      last_name: "Katz".into(),
      father_name: None,
      birth_date: Some(birth),
      sex,
      mobile_number: None,
      email: None,
      address: None,
      religious_info: None,
      notes: None,
    }
  }

  #[tokio::test]
  async fn bar_mitzvah_notification_is_raised_at_the_lead_window() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let today = d(2024, 1, 1);
    // Bar mitzvah on 2024-06-29, exactly 180 days after `today`.
    store
      .add_person(person("Noam", d(2011, 6, 29), Some(Sex::Male)))
      .await
      .unwrap();
    // Same birth date but female: bat mitzvah was in 2023, no notification.
    store
      .add_person(person("Tamar", d(2011, 6, 29), Some(Sex::Female)))
      .await
      .unwrap();

    run_once(&store, today, 180).await;

    let notifications = store.list_notifications().await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::BarMitzvah);
    assert!(notifications[0].message.contains("Noam"));
  }

  #[tokio::test]
  async fn birthday_notification_is_raised_on_the_day() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .add_person(person("Moshe", d(1990, 3, 14), Some(Sex::Male)))
      .await
      .unwrap();

    run_once(&store, d(2026, 3, 14), 180).await;

    let notifications = store.list_notifications().await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::Birthday);
  }

  #[tokio::test]
  async fn quiet_days_create_no_notifications() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store
      .add_person(person("Moshe", d(1990, 3, 14), Some(Sex::Male)))
      .await
      .unwrap();

    run_once(&store, d(2026, 7, 1), 180).await;
    assert!(store.list_notifications().await.unwrap().is_empty());
  }
}
