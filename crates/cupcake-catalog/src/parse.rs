//! Interpretation of remote config values.

use crate::{CatalogError, RemoteValue, RemoteValues};
use cupcake_types::{CatalogConfig, QuantityOption, DEFAULT_FLAVORS};

/// Keys of the five flavor slots, in display order.
pub const FLAVOR_KEYS: [&str; 5] = ["flavour1", "flavour2", "flavour3", "flavour4", "flavour5"];

/// When false, the twelve cupcake tier is withdrawn.
pub const TWELVE_CUPCAKES_ENABLED: &str = "twelve_cupcakes_enabled";

pub const PICTURE_VARIANT_ENABLED: &str = "picture_variant_enabled";

pub const DISCOUNT_ENABLED: &str = "discount_enabled";

/// Builds a catalog from one fetch result.
///
/// Keys absent from the mapping take their in-app defaults. Empty flavor
/// slots are skipped and repeated flavors keep their first position.
pub fn catalog_from_remote(values: &RemoteValues) -> Result<CatalogConfig, CatalogError> {
	let mut flavors: Vec<String> = Vec::with_capacity(FLAVOR_KEYS.len());
	for (key, default) in FLAVOR_KEYS.into_iter().zip(DEFAULT_FLAVORS) {
		let flavor = text(values, key)?.unwrap_or(default).trim();
		if !flavor.is_empty() && !flavors.iter().any(|f| f == flavor) {
			flavors.push(flavor.to_string());
		}
	}
	if flavors.is_empty() {
		return Err(CatalogError::Malformed("no flavor configured".into()));
	}

	let mut quantity_options = vec![QuantityOption::one(), QuantityOption::six()];
	if flag(values, TWELVE_CUPCAKES_ENABLED, true)? {
		quantity_options.push(QuantityOption::twelve());
	}

	Ok(CatalogConfig {
		flavors,
		quantity_options,
		picture_variant_enabled: flag(values, PICTURE_VARIANT_ENABLED, false)?,
		discount_enabled: flag(values, DISCOUNT_ENABLED, false)?,
	})
}

fn text<'a>(values: &'a RemoteValues, key: &str) -> Result<Option<&'a str>, CatalogError> {
	match values.get(key) {
		None => Ok(None),
		Some(RemoteValue::Text(s)) => Ok(Some(s)),
		Some(RemoteValue::Bool(_)) => Err(CatalogError::Malformed(format!(
			"'{}' must be a string",
			key
		))),
	}
}

fn flag(values: &RemoteValues, key: &str, default: bool) -> Result<bool, CatalogError> {
	match values.get(key) {
		None => Ok(default),
		Some(RemoteValue::Bool(b)) => Ok(*b),
		// Config consoles commonly deliver booleans as strings
		Some(RemoteValue::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
			"true" => Ok(true),
			"false" => Ok(false),
			_ => Err(CatalogError::Malformed(format!(
				"'{}' must be a boolean, got '{}'",
				key, s
			))),
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn values(pairs: &[(&str, RemoteValue)]) -> RemoteValues {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.clone()))
			.collect()
	}

	fn text_value(s: &str) -> RemoteValue {
		RemoteValue::Text(s.to_string())
	}

	#[test]
	fn test_empty_mapping_yields_defaults() {
		assert_eq!(
			catalog_from_remote(&RemoteValues::new()).unwrap(),
			CatalogConfig::defaults()
		);
	}

	#[test]
	fn test_remote_flavors_and_toggles() {
		let config = catalog_from_remote(&values(&[
			("flavour1", text_value("Lemon")),
			("flavour2", text_value("")),
			("flavour3", text_value("Lemon")),
			(PICTURE_VARIANT_ENABLED, RemoteValue::Bool(true)),
			(DISCOUNT_ENABLED, text_value("TRUE")),
		]))
		.unwrap();

		assert_eq!(config.flavors, vec!["Lemon", "Salted Caramel", "Coffee"]);
		assert!(config.picture_variant_enabled);
		assert!(config.discount_enabled);
		assert_eq!(config.largest_tier(), 12);
	}

	#[test]
	fn test_twelve_tier_withdrawn() {
		let config =
			catalog_from_remote(&values(&[(TWELVE_CUPCAKES_ENABLED, RemoteValue::Bool(false))]))
				.unwrap();
		let counts: Vec<_> = config.quantity_options.iter().map(|o| o.count).collect();
		assert_eq!(counts, vec![1, 6]);
		assert_eq!(config.largest_tier(), 6);
	}

	#[test]
	fn test_all_flavors_blank_is_malformed() {
		let blank: Vec<_> = FLAVOR_KEYS.iter().map(|k| (*k, text_value(" "))).collect();
		assert!(matches!(
			catalog_from_remote(&values(&blank)),
			Err(CatalogError::Malformed(_))
		));
	}

	#[test]
	fn test_wrong_types_are_malformed() {
		assert!(catalog_from_remote(&values(&[("flavour1", RemoteValue::Bool(true))])).is_err());
		assert!(catalog_from_remote(&values(&[(DISCOUNT_ENABLED, text_value("maybe"))])).is_err());
	}
}
