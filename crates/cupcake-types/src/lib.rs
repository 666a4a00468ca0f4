//! Common types module for the cupcake shop.
//!
//! This module defines the core data types shared by every shop component:
//! the in-progress order, persisted order records, the catalog, wizard steps,
//! sessions and the events exchanged over the event bus.

/// Catalog types: flavors, quantity tiers and feature toggles.
pub mod catalog;
/// Event types for inter-service communication.
pub mod events;
/// Order types for the in-progress order and persisted records.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Session types produced by sign-in.
pub mod session;
/// Storage namespaces for persisted collections.
pub mod storage;
/// Utility functions and the injectable clock.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;
/// Wizard step enumeration.
pub mod wizard;

// Re-export all types for convenient access
pub use catalog::*;
pub use events::*;
pub use order::*;
pub use registry::*;
pub use session::*;
pub use storage::*;
pub use utils::{
	format_price, pickup_label, truncate_id, Clock, FixedClock, SystemClock, PICKUP_DATE_FORMAT,
	RECORD_DATE_FORMAT,
};
pub use validation::*;
pub use wizard::*;
