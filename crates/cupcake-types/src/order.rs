//! Order types for the cupcake shop.
//!
//! `Order` is the value object the wizard mutates field by field while the
//! customer moves through the screens. `OrderRecord` is the immutable shape
//! written to the document store once an order has been submitted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An order in progress.
///
/// Every field starts empty. The price is derived from the other fields and is
/// kept up to date by the order state holder, never set directly by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	/// Number of cupcakes, one of the catalog tiers (0 while unselected).
	pub quantity: u32,
	/// Chosen flavor ("" while unselected).
	pub flavor: String,
	/// Derived price for the current selections.
	pub price: Decimal,
	/// Pickup date label taken from the generated pickup options ("" while unselected).
	pub pickup_date: String,
}

impl Order {
	/// Returns an order with every field cleared.
	pub fn empty() -> Self {
		Self::default()
	}

	/// True when no field has been selected yet.
	pub fn is_empty(&self) -> bool {
		self.quantity == 0
			&& self.flavor.is_empty()
			&& self.pickup_date.is_empty()
			&& self.price.is_zero()
	}
}

/// A submitted order as persisted under a user's order collection.
///
/// Records are append-only: there is no update or delete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
	pub quantity: u32,
	pub flavor: String,
	pub price: Decimal,
	/// Submission time, ISO-8601 on the local clock.
	pub date: String,
}

impl OrderRecord {
	/// Builds the record for a submitted order stamped with `submitted_at`.
	pub fn from_order(order: &Order, submitted_at: impl Into<String>) -> Self {
		Self {
			quantity: order.quantity,
			flavor: order.flavor.clone(),
			price: order.price,
			date: submitted_at.into(),
		}
	}
}
