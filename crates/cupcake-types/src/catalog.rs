//! Catalog types for the cupcake shop.
//!
//! The catalog lists what can be ordered: the flavors on offer, the quantity
//! tiers and two feature toggles delivered by the remote config service.

use serde::{Deserialize, Serialize};

/// Flavors served when the remote config cannot be fetched.
pub const DEFAULT_FLAVORS: [&str; 5] = [
	"Vanilla",
	"Chocolate",
	"Red Velvet",
	"Salted Caramel",
	"Coffee",
];

/// A selectable quantity tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityOption {
	/// Human readable label, e.g. "Six Cupcakes".
	pub label: String,
	/// Number of cupcakes in the tier.
	pub count: u32,
}

impl QuantityOption {
	pub fn new(label: impl Into<String>, count: u32) -> Self {
		Self {
			label: label.into(),
			count,
		}
	}

	pub fn one() -> Self {
		Self::new("One Cupcake", 1)
	}

	pub fn six() -> Self {
		Self::new("Six Cupcakes", 6)
	}

	pub fn twelve() -> Self {
		Self::new("Twelve Cupcakes", 12)
	}
}

/// The purchasable catalog for one session.
///
/// Invariant: `quantity_options` is never empty and `flavors` holds at least
/// one entry. Both the defaults and every config built from remote values
/// uphold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
	pub flavors: Vec<String>,
	pub quantity_options: Vec<QuantityOption>,
	pub picture_variant_enabled: bool,
	pub discount_enabled: bool,
}

impl CatalogConfig {
	/// Returns the fixed fallback catalog.
	pub fn defaults() -> Self {
		Self {
			flavors: DEFAULT_FLAVORS.iter().map(|f| f.to_string()).collect(),
			quantity_options: vec![
				QuantityOption::one(),
				QuantityOption::six(),
				QuantityOption::twelve(),
			],
			picture_variant_enabled: false,
			discount_enabled: false,
		}
	}

	/// The largest quantity tier on offer.
	pub fn largest_tier(&self) -> u32 {
		self.quantity_options
			.iter()
			.map(|option| option.count)
			.max()
			.unwrap_or(0)
	}

	pub fn offers_quantity(&self, count: u32) -> bool {
		self.quantity_options.iter().any(|option| option.count == count)
	}

	pub fn offers_flavor(&self, flavor: &str) -> bool {
		self.flavors.iter().any(|f| f == flavor)
	}
}

impl Default for CatalogConfig {
	fn default() -> Self {
		Self::defaults()
	}
}

/// Where the catalog handed out by the provider came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogSource {
	/// A fresh, successful remote fetch.
	Remote,
	/// The last successful fetch, served after a failure or within the cooldown.
	Cached,
	/// The hardcoded fallback set.
	Defaults,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let catalog = CatalogConfig::defaults();
		assert_eq!(
			catalog.flavors,
			vec!["Vanilla", "Chocolate", "Red Velvet", "Salted Caramel", "Coffee"]
		);
		let tiers: Vec<u32> = catalog.quantity_options.iter().map(|o| o.count).collect();
		assert_eq!(tiers, vec![1, 6, 12]);
		assert!(!catalog.picture_variant_enabled);
		assert!(!catalog.discount_enabled);
	}

	#[test]
	fn test_largest_tier() {
		let mut catalog = CatalogConfig::defaults();
		assert_eq!(catalog.largest_tier(), 12);

		catalog.quantity_options = vec![QuantityOption::one(), QuantityOption::six()];
		assert_eq!(catalog.largest_tier(), 6);
	}

	#[test]
	fn test_offers() {
		let catalog = CatalogConfig::defaults();
		assert!(catalog.offers_quantity(6));
		assert!(!catalog.offers_quantity(7));
		assert!(catalog.offers_flavor("Coffee"));
		assert!(!catalog.offers_flavor("coffee"));
	}
}
