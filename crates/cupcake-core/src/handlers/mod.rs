//! Handlers for side channels of the shop.
//!
//! The analytics handler consumes events from the bus; the push token
//! registrar receives tokens from the messaging service.

pub mod analytics;
pub mod push_token;

pub use analytics::{AnalyticsCounters, AnalyticsHandler};
pub use push_token::PushTokenRegistrar;
