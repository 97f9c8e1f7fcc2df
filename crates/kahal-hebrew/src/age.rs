//! Civil age and coming-of-age arithmetic.

use chrono::{Datelike, NaiveDate};
use kahal_core::person::Sex;

/// Completed years between `birth` and `today`.
/// Dates before birth clamp to zero.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> u32 {
  let mut age = today.year() - birth.year();
  if (today.month(), today.day()) < (birth.month(), birth.day()) {
    age -= 1;
  }
  age.max(0) as u32
}

/// The civil date of the person's coming of age: the 13th birthday for a
/// boy (bar mitzvah), the 12th for a girl (bat mitzvah). A February 29th
/// birth date falls back to March 1st in a non-leap target year.
///
/// Returns `None` only if the target year is out of calendar range.
pub fn coming_of_age_date(birth: NaiveDate, sex: Sex) -> Option<NaiveDate> {
  let years = match sex {
    Sex::Male => 13,
    Sex::Female => 12,
  };
  let target_year = birth.year() + years;
  NaiveDate::from_ymd_opt(target_year, birth.month(), birth.day())
    .or_else(|| NaiveDate::from_ymd_opt(target_year, 3, 1))
}
