//! Calendar utilities for the Kahal registry: civil age, Hebrew-calendar
//! birth-date labels, and coming-of-age dates.
//!
//! Everything here is a pure function; the store calls these when a birth
//! date is written and the nightly refresh job calls them in bulk.

pub mod age;
pub mod calendar;
pub mod error;

pub use age::{age_on, coming_of_age_date};
pub use calendar::{HebrewDate, hebrew_date, hebrew_label};
pub use error::{Error, Result};
