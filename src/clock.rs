//! Source of "today" for requests that do not name a date.

use chrono::{NaiveDate, Utc};
use std::fmt::Debug;

/// Supplies the current UTC calendar date.
pub trait Clock: Send + Sync + Debug {
    fn today(&self) -> NaiveDate;
}

/// Wall clock, in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
