//! Time source for generated identifiers.
//!
//! Matricules embed the current year, so the generator asks a [`Clock`]
//! instead of reading the system time directly. Tests pin the year with
//! [`FixedClock`].

use chrono::{DateTime, Datelike, Utc};
use std::fmt;

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar year used for the year component of identifiers.
    fn year(&self) -> i32 {
        self.now().year()
    }
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freeze the clock at noon on January 1st of `year`.
    ///
    /// Returns `None` for years chrono cannot represent.
    pub fn at_year(year: i32) -> Option<Self> {
        chrono::NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .map(|naive| Self(naive.and_utc()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_year() {
        let clock = FixedClock::at_year(2031).unwrap();
        assert_eq!(clock.year(), 2031);
    }

    #[test]
    fn test_system_clock_is_recent() {
        assert!(SystemClock.year() >= 2024);
    }
}
