//! Civil-to-Hebrew date conversion.
//!
//! The conversion itself is delegated to `icu_calendar`'s arithmetic
//! Hebrew calendar; this module only maps CLDR month codes to the
//! transliterated names used in the stored label.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use icu_calendar::{Date, hebrew::Hebrew};
use serde::Serialize;

use crate::error::{Error, Result};

/// A date on the Hebrew calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HebrewDate {
  pub year:       i32,
  /// Ordinal month within the Hebrew year (Tishrei = 1).
  pub month:      u32,
  pub day:        u32,
  pub month_name: &'static str,
}

impl fmt::Display for HebrewDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} {}", self.day, self.month_name, self.year)
  }
}

/// Whether a Hebrew year has the leap month Adar I.
pub fn is_leap_year(hebrew_year: i32) -> bool {
  (7 * hebrew_year + 1).rem_euclid(19) < 7
}

fn month_name(code: &str, hebrew_year: i32) -> Result<&'static str> {
  let name = match code {
    "M01" => "Tishrei",
    "M02" => "Cheshvan",
    "M03" => "Kislev",
    "M04" => "Tevet",
    "M05" => "Shevat",
    "M05L" => "Adar I",
    "M06" => {
      if is_leap_year(hebrew_year) {
        "Adar II"
      } else {
        "Adar"
      }
    }
    "M07" => "Nisan",
    "M08" => "Iyar",
    "M09" => "Sivan",
    "M10" => "Tammuz",
    "M11" => "Av",
    "M12" => "Elul",
    other => {
      return Err(Error::Calendar(format!("unknown month code {other:?}")));
    }
  };
  Ok(name)
}

/// Convert a civil date to its Hebrew-calendar equivalent.
pub fn hebrew_date(civil: NaiveDate) -> Result<HebrewDate> {
  let iso = Date::try_new_iso_date(
    civil.year(),
    civil.month() as u8,
    civil.day() as u8,
  )
  .map_err(|e| Error::Calendar(e.to_string()))?;

  let date = iso.to_calendar(Hebrew::new());
  let year = date.year().number;
  let month = date.month();

  Ok(HebrewDate {
    year,
    month: month.ordinal,
    day: date.day_of_month().0,
    month_name: month_name(month.code.0.as_str(), year)?,
  })
}

/// The label stored on the person record, e.g. `"20 Tevet 5784"`.
pub fn hebrew_label(civil: NaiveDate) -> Result<String> {
  Ok(hebrew_date(civil)?.to_string())
}
