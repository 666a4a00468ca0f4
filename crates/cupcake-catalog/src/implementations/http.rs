//! Remote config values served over HTTP.
//!
//! The endpoint must answer a GET with a JSON object mapping keys to string
//! or boolean values.

use crate::{
	CatalogError, RemoteConfigFactory, RemoteConfigInterface, RemoteConfigRegistry, RemoteValues,
};
use async_trait::async_trait;
use cupcake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::time::Duration;

/// Source backed by a JSON endpoint.
pub struct HttpConfig {
	client: reqwest::Client,
	url: String,
}

impl HttpConfig {
	pub fn new(client: reqwest::Client, url: String) -> Self {
		Self { client, url }
	}
}

#[async_trait]
impl RemoteConfigInterface for HttpConfig {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpConfigSchema)
	}

	async fn fetch(&self) -> Result<RemoteValues, CatalogError> {
		let response = self
			.client
			.get(&self.url)
			.send()
			.await
			.map_err(|e| CatalogError::Fetch(e.to_string()))?
			.error_for_status()
			.map_err(|e| CatalogError::Fetch(e.to_string()))?;

		response
			.json::<RemoteValues>()
			.await
			.map_err(|e| CatalogError::Malformed(e.to_string()))
	}
}

/// Configuration schema for HttpConfig.
pub struct HttpConfigSchema;

impl ConfigSchema for HttpConfigSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
					_ => Err("url must start with http:// or https://".to_string()),
				}
			})],
			vec![Field::new(
				"request_timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create an HTTP config source.
///
/// Configuration parameters:
/// - `url`: endpoint answering with the key/value object
/// - `request_timeout_seconds`: transport level timeout (default: 30)
pub fn create_source(config: &toml::Value) -> Result<Box<dyn RemoteConfigInterface>, CatalogError> {
	HttpConfigSchema
		.validate(config)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| CatalogError::Configuration("url is required".into()))?
		.to_string();
	let request_timeout = config
		.get("request_timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;

	let client = reqwest::Client::builder()
		.timeout(Duration::from_secs(request_timeout))
		.build()
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	Ok(Box::new(HttpConfig::new(client, url)))
}

/// Registry for the HTTP config implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = RemoteConfigFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl RemoteConfigRegistry for Registry {}
