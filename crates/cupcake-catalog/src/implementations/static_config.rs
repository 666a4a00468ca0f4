//! Remote config values fixed in the shop configuration.
//!
//! Useful for development and for deployments without a config service: the
//! implementation table itself is the key/value mapping.

use crate::{
	CatalogError, RemoteConfigFactory, RemoteConfigInterface, RemoteConfigRegistry, RemoteValue,
	RemoteValues, DISCOUNT_ENABLED, FLAVOR_KEYS, PICTURE_VARIANT_ENABLED, TWELVE_CUPCAKES_ENABLED,
};
use async_trait::async_trait;
use cupcake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// Source that always answers with the same values.
pub struct StaticConfig {
	values: RemoteValues,
}

impl StaticConfig {
	pub fn new(values: RemoteValues) -> Self {
		Self { values }
	}
}

#[async_trait]
impl RemoteConfigInterface for StaticConfig {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(StaticConfigSchema)
	}

	async fn fetch(&self) -> Result<RemoteValues, CatalogError> {
		Ok(self.values.clone())
	}
}

/// Configuration schema for StaticConfig.
pub struct StaticConfigSchema;

impl ConfigSchema for StaticConfigSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional: Vec<Field> = FLAVOR_KEYS
			.iter()
			.map(|key| Field::new(*key, FieldType::String))
			.collect();
		for key in [TWELVE_CUPCAKES_ENABLED, PICTURE_VARIANT_ENABLED, DISCOUNT_ENABLED] {
			optional.push(Field::new(key, FieldType::Boolean));
		}

		Schema::new(vec![], optional).validate(config)
	}
}

/// Factory function to create a static config source.
///
/// Configuration parameters: any of `flavour1`..`flavour5` (strings) and
/// `twelve_cupcakes_enabled`, `picture_variant_enabled`, `discount_enabled`
/// (booleans). Other keys are passed through as long as they are strings or
/// booleans.
pub fn create_source(config: &toml::Value) -> Result<Box<dyn RemoteConfigInterface>, CatalogError> {
	StaticConfigSchema
		.validate(config)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	let mut values = RemoteValues::new();
	if let Some(table) = config.as_table() {
		for (key, value) in table {
			let value = RemoteValue::from_toml(value).ok_or_else(|| {
				CatalogError::Configuration(format!(
					"'{}' must be a string or a boolean, got {}",
					key,
					value.type_str()
				))
			})?;
			values.insert(key.clone(), value);
		}
	}

	Ok(Box::new(StaticConfig::new(values)))
}

/// Registry for the static config implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "static";
	type Factory = RemoteConfigFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl RemoteConfigRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog_from_remote;

	#[tokio::test]
	async fn test_values_from_table() {
		let config: toml::Value = toml::from_str(
			"flavour1 = \"Pistachio\"\ntwelve_cupcakes_enabled = false\n",
		)
		.unwrap();
		let source = create_source(&config).unwrap();

		let catalog = catalog_from_remote(&source.fetch().await.unwrap()).unwrap();
		assert_eq!(catalog.flavors[0], "Pistachio");
		assert_eq!(catalog.largest_tier(), 6);
	}

	#[test]
	fn test_wrong_types_rejected() {
		let config: toml::Value = toml::from_str("discount_enabled = \"yes\"").unwrap();
		assert!(create_source(&config).is_err());

		let config: toml::Value = toml::from_str("banner_count = 3").unwrap();
		assert!(matches!(
			create_source(&config),
			Err(CatalogError::Configuration(_))
		));
	}
}
