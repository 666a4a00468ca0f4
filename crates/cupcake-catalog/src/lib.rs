//! Catalog module for the cupcake shop.
//!
//! The catalog (flavors, quantity tiers and feature toggles) is driven by a
//! remote key/value config service. This crate defines the interface of that
//! service, turns its raw values into a `CatalogConfig`, and provides the
//! `CatalogProvider` that caches the result and falls back to fixed defaults
//! whenever the service misbehaves.

use async_trait::async_trait;
use cupcake_types::{ConfigSchema, ImplementationRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

mod parse;
mod provider;

pub use parse::{
	catalog_from_remote, DISCOUNT_ENABLED, FLAVOR_KEYS, PICTURE_VARIANT_ENABLED,
	TWELVE_CUPCAKES_ENABLED,
};
pub use provider::{CatalogProvider, CatalogSnapshot};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod http;
	pub mod static_config;
}

/// Errors that can occur while fetching the remote catalog.
///
/// None of these reach the wizard: the provider absorbs them and serves a
/// fallback catalog instead.
#[derive(Debug, Error)]
pub enum CatalogError {
	/// The remote source could not be reached or refused the request.
	#[error("Fetch failed: {0}")]
	Fetch(String),
	/// The remote source did not answer in time.
	#[error("Fetch timed out after {0:?}")]
	Timeout(Duration),
	/// The remote source answered with values that do not form a catalog.
	#[error("Malformed config: {0}")]
	Malformed(String),
	/// Error that occurs when the implementation settings are invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A single value delivered by the remote config service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteValue {
	Bool(bool),
	Text(String),
}

impl RemoteValue {
	/// Converts a TOML value, accepting only strings and booleans.
	pub fn from_toml(value: &toml::Value) -> Option<Self> {
		match value {
			toml::Value::Boolean(b) => Some(Self::Bool(*b)),
			toml::Value::String(s) => Some(Self::Text(s.clone())),
			_ => None,
		}
	}
}

/// Raw key/value mapping returned by one fetch.
pub type RemoteValues = HashMap<String, RemoteValue>;

/// Trait defining the interface for remote config sources.
///
/// This trait must be implemented by any config service that wants to drive
/// the catalog. Implementations return the raw values; interpretation and
/// fallback happen in the provider.
#[async_trait]
pub trait RemoteConfigInterface: Send + Sync {
	/// Returns the configuration schema for this source.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches the current key/value mapping.
	async fn fetch(&self) -> Result<RemoteValues, CatalogError>;
}

/// Type alias for remote config factory functions.
pub type RemoteConfigFactory =
	fn(&toml::Value) -> Result<Box<dyn RemoteConfigInterface>, CatalogError>;

/// Registry trait for remote config implementations.
pub trait RemoteConfigRegistry: ImplementationRegistry<Factory = RemoteConfigFactory> {}

/// Get all registered remote config implementations.
///
/// Returns a vector of (name, factory) tuples for all available sources.
pub fn get_all_implementations() -> Vec<(&'static str, RemoteConfigFactory)> {
	use implementations::{file, http, static_config};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(http::Registry::NAME, http::Registry::factory()),
		(static_config::Registry::NAME, static_config::Registry::factory()),
	]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_remote_value_json_shapes() {
		let values: RemoteValues =
			serde_json::from_str(r#"{"flavour1": "Lemon", "discount_enabled": true}"#).unwrap();
		assert_eq!(values["flavour1"], RemoteValue::Text("Lemon".into()));
		assert_eq!(values["discount_enabled"], RemoteValue::Bool(true));

		// Numbers are not a value type the service delivers
		assert!(serde_json::from_str::<RemoteValues>(r#"{"flavour1": 3}"#).is_err());
	}

	#[test]
	fn test_remote_value_from_toml() {
		assert_eq!(
			RemoteValue::from_toml(&toml::Value::Boolean(false)),
			Some(RemoteValue::Bool(false))
		);
		assert_eq!(RemoteValue::from_toml(&toml::Value::Integer(1)), None);
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations().into_iter().map(|(n, _)| n).collect();
		assert_eq!(names, vec!["file", "http", "static"]);
	}
}
