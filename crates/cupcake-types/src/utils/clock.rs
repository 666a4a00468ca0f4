//! Wall clock abstraction.
//!
//! Pickup labels and the same-day rules compare against the current local
//! calendar day, so everything that needs "now" takes a `Clock`.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Pickup date label format: abbreviated weekday, month and day ("Sat Oct 17").
pub const PICKUP_DATE_FORMAT: &str = "%a %b %-d";

/// Record timestamp format: ISO-8601 local date-time without offset.
pub const RECORD_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of the current local date and time.
pub trait Clock: Send + Sync {
	/// Current local wall-clock time.
	fn now(&self) -> NaiveDateTime;

	/// Current local calendar day.
	fn today(&self) -> NaiveDate {
		self.now().date()
	}
}

/// Clock backed by the system's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> NaiveDateTime {
		Local::now().naive_local()
	}
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
	now: NaiveDateTime,
}

impl FixedClock {
	pub fn new(now: NaiveDateTime) -> Self {
		Self { now }
	}
}

impl Clock for FixedClock {
	fn now(&self) -> NaiveDateTime {
		self.now
	}
}

/// Formats a calendar day as a pickup label.
pub fn pickup_label(date: NaiveDate) -> String {
	date.format(PICKUP_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_pickup_label() {
		let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
		assert_eq!(pickup_label(date), "Sat Oct 17");

		let date = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
		assert_eq!(pickup_label(date), "Mon Nov 2");
	}

	#[test]
	fn test_fixed_clock() {
		let now = NaiveDate::from_ymd_opt(2026, 10, 17)
			.unwrap()
			.and_hms_opt(9, 30, 0)
			.unwrap();
		let clock = FixedClock::new(now);
		assert_eq!(clock.now(), now);
		assert_eq!(clock.today(), now.date());
		assert_eq!(
			clock.now().format(RECORD_DATE_FORMAT).to_string(),
			"2026-10-17T09:30:00"
		);
	}
}
