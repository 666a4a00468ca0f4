//! Utility functions shared across the shop crates.
//!
//! Formatting helpers for logs and display, plus the clock abstraction used
//! wherever "today" matters (pricing, pickup options, record timestamps).

pub mod clock;
pub mod formatting;

pub use clock::{pickup_label, Clock, FixedClock, SystemClock, PICKUP_DATE_FORMAT, RECORD_DATE_FORMAT};
pub use formatting::{format_price, truncate_id};
