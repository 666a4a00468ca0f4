//! Remote config values read from a file on disk.
//!
//! The file is re-read on every fetch, so editing it changes the catalog
//! once the fetch cooldown has passed. JSON and TOML are supported.

use crate::{
	CatalogError, RemoteConfigFactory, RemoteConfigInterface, RemoteConfigRegistry, RemoteValues,
};
use async_trait::async_trait;
use cupcake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;

/// Encoding of the values file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
	Json,
	Toml,
}

impl FileFormat {
	fn parse(name: &str) -> Option<Self> {
		match name {
			"json" => Some(Self::Json),
			"toml" => Some(Self::Toml),
			_ => None,
		}
	}
}

/// Source backed by a JSON or TOML object of key/value pairs.
pub struct FileConfig {
	path: PathBuf,
	format: FileFormat,
}

impl FileConfig {
	pub fn new(path: PathBuf, format: FileFormat) -> Self {
		Self { path, format }
	}
}

#[async_trait]
impl RemoteConfigInterface for FileConfig {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileConfigSchema)
	}

	async fn fetch(&self) -> Result<RemoteValues, CatalogError> {
		let content = tokio::fs::read_to_string(&self.path)
			.await
			.map_err(|e| CatalogError::Fetch(format!("{}: {}", self.path.display(), e)))?;

		match self.format {
			FileFormat::Json => serde_json::from_str(&content)
				.map_err(|e| CatalogError::Malformed(e.to_string())),
			FileFormat::Toml => {
				toml::from_str(&content).map_err(|e| CatalogError::Malformed(e.message().to_string()))
			},
		}
	}
}

/// Configuration schema for FileConfig.
pub struct FileConfigSchema;

impl ConfigSchema for FileConfigSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String)],
			vec![Field::new("format", FieldType::String).with_validator(|value| {
				match value.as_str().and_then(FileFormat::parse) {
					Some(_) => Ok(()),
					None => Err("format must be 'json' or 'toml'".to_string()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file config source.
///
/// Configuration parameters:
/// - `path`: file holding the key/value object
/// - `format`: "json" or "toml" (default: taken from the file extension, else json)
pub fn create_source(config: &toml::Value) -> Result<Box<dyn RemoteConfigInterface>, CatalogError> {
	FileConfigSchema
		.validate(config)
		.map_err(|e| CatalogError::Configuration(e.to_string()))?;

	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.map(PathBuf::from)
		.ok_or_else(|| CatalogError::Configuration("path is required".into()))?;

	let format = config
		.get("format")
		.and_then(|v| v.as_str())
		.and_then(FileFormat::parse)
		.or_else(|| {
			path.extension()
				.and_then(|ext| ext.to_str())
				.and_then(FileFormat::parse)
		})
		.unwrap_or(FileFormat::Json);

	Ok(Box::new(FileConfig::new(path, format)))
}

/// Registry for the file config implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = RemoteConfigFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl RemoteConfigRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::RemoteValue;
	use tempfile::TempDir;

	fn source_for(path: &std::path::Path) -> Box<dyn RemoteConfigInterface> {
		let mut table = toml::Table::new();
		table.insert(
			"path".into(),
			toml::Value::String(path.display().to_string()),
		);
		create_source(&toml::Value::Table(table)).unwrap()
	}

	#[tokio::test]
	async fn test_reads_json_and_rereads_on_fetch() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("remote.json");
		std::fs::write(&path, r#"{"flavour1": "Mango"}"#).unwrap();

		let source = source_for(&path);
		let values = source.fetch().await.unwrap();
		assert_eq!(values["flavour1"], RemoteValue::Text("Mango".into()));

		std::fs::write(&path, r#"{"flavour1": "Peach"}"#).unwrap();
		let values = source.fetch().await.unwrap();
		assert_eq!(values["flavour1"], RemoteValue::Text("Peach".into()));
	}

	#[tokio::test]
	async fn test_reads_toml_by_extension() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("remote.toml");
		std::fs::write(&path, "discount_enabled = true\n").unwrap();

		let values = source_for(&path).fetch().await.unwrap();
		assert_eq!(values["discount_enabled"], RemoteValue::Bool(true));
	}

	#[tokio::test]
	async fn test_missing_and_garbled_files() {
		let temp_dir = TempDir::new().unwrap();
		let path = temp_dir.path().join("remote.json");

		assert!(matches!(
			source_for(&path).fetch().await,
			Err(CatalogError::Fetch(_))
		));

		std::fs::write(&path, "{ not json").unwrap();
		assert!(matches!(
			source_for(&path).fetch().await,
			Err(CatalogError::Malformed(_))
		));
	}

	#[test]
	fn test_unknown_format_rejected() {
		let config: toml::Value =
			toml::from_str("path = \"remote.cfg\"\nformat = \"yaml\"").unwrap();
		assert!(create_source(&config).is_err());
	}
}
