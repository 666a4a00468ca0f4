//! File-based storage backend for the cupcake shop.
//!
//! Each document is one JSON file at `<storage_path>/<namespace>/<id>.json`,
//! where every `/`-separated namespace segment becomes a directory.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use cupcake_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};
use std::path::PathBuf;
use tokio::fs;

const EXTENSION: &str = "json";

/// File-based storage implementation.
///
/// This implementation stores documents as files on the filesystem,
/// providing simple persistence without requiring external dependencies.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance with the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Maps a namespace to its directory, one encoded directory per segment.
	fn namespace_dir(&self, namespace: &str) -> PathBuf {
		namespace
			.split('/')
			.filter(|segment| !segment.is_empty())
			.fold(self.base_path.clone(), |dir, segment| {
				dir.join(encode_segment(segment))
			})
	}

	fn get_file_path(&self, namespace: &str, id: &str) -> PathBuf {
		self.namespace_dir(namespace)
			.join(format!("{}.{}", encode_segment(id), EXTENSION))
	}
}

/// Makes a path segment filesystem-safe.
///
/// ASCII alphanumerics and `-` are kept, every other byte becomes `%XX`.
/// `_` and `%` are escaped too, so distinct segments never share a path,
/// and `.` or `..` cannot appear.
fn encode_segment(segment: &str) -> String {
	let mut encoded = String::with_capacity(segment.len());
	for byte in segment.bytes() {
		if byte.is_ascii_alphanumeric() || byte == b'-' {
			encoded.push(byte as char);
		} else {
			encoded.push_str(&format!("%{:02X}", byte));
		}
	}
	encoded
}

/// Reverses [`encode_segment`] for a listed file stem.
fn decode_segment(encoded: &str) -> Option<String> {
	let bytes = encoded.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let hex = encoded.get(i + 1..i + 3)?;
			decoded.push(u8::from_str_radix(hex, 16).ok()?);
			i += 3;
		} else {
			decoded.push(bytes[i]);
			i += 1;
		}
	}
	String::from_utf8(decoded).ok()
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, namespace: &str, id: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(namespace, id);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(
		&self,
		namespace: &str,
		id: &str,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let path = self.get_file_path(namespace, id);

		if fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			return Err(StorageError::AlreadyExists(format!("{}/{}", namespace, id)));
		}

		// Create parent directory if it doesn't exist
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		// Write atomically by writing to temp file then renaming
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		tracing::trace!(path = %path.display(), "Wrote document");
		Ok(())
	}

	async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let path = self.get_file_path(namespace, id);
		fs::try_exists(&path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn list_bytes(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
		let dir = self.namespace_dir(namespace);

		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut documents = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				// Leftover temp files and nested collections
				continue;
			}
			let Some(id) = path.file_stem().and_then(|s| s.to_str()).and_then(decode_segment) else {
				tracing::debug!("Skipping file {:?}: name is not an encoded id", path);
				continue;
			};
			let data = fs::read(&path)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
			documents.push((id, data));
		}

		documents.sort_by(|a, b| a.0.cmp(&b.0));
		Ok(documents)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![], // No required fields
			vec![Field::new("storage_path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if !path.trim().is_empty() => Ok(()),
					_ => Err("storage_path cannot be empty".to_string()),
				}
			})],
		);

		schema.validate(config)
	}
}

/// Factory function to create a storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage")
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_write_read_list() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage
			.set_bytes("users/u1/orders", "r1", b"{\"a\":1}".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("users/u1/orders", "r2", b"{\"a\":2}".to_vec())
			.await
			.unwrap();

		assert!(temp_dir
			.path()
			.join("users")
			.join("u1")
			.join("orders")
			.join("r1.json")
			.exists());
		assert_eq!(
			storage.get_bytes("users/u1/orders", "r2").await.unwrap(),
			b"{\"a\":2}".to_vec()
		);

		let listed = storage.list_bytes("users/u1/orders").await.unwrap();
		let ids: Vec<_> = listed.iter().map(|(id, _)| id.as_str()).collect();
		assert_eq!(ids, vec!["r1", "r2"]);
	}

	#[tokio::test]
	async fn test_missing_documents() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		assert!(matches!(
			storage.get_bytes("users/u1/orders", "nope").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("users/u1/orders", "nope").await.unwrap());
		assert!(storage.list_bytes("users/u1/orders").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_create_only() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage.set_bytes("ns", "id", b"1".to_vec()).await.unwrap();
		let result = storage.set_bytes("ns", "id", b"2".to_vec()).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
		assert_eq!(storage.get_bytes("ns", "id").await.unwrap(), b"1".to_vec());
	}

	#[tokio::test]
	async fn test_namespace_cannot_escape_base() {
		let temp_dir = TempDir::new().unwrap();
		let base = temp_dir.path().join("store");
		let storage = FileStorage::new(base.clone());

		storage
			.set_bytes("users/../../escape", "x", b"1".to_vec())
			.await
			.unwrap();

		assert!(base
			.join("users")
			.join("%2E%2E")
			.join("%2E%2E")
			.join("escape")
			.join("x.json")
			.exists());
		assert!(!temp_dir.path().join("escape").exists());
	}

	#[tokio::test]
	async fn test_lookalike_user_ids_stay_apart() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage
			.set_bytes("users/sam@shop.com/orders", "r1", b"vanilla".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("users/sam_shop_com/orders", "r1", b"coffee".to_vec())
			.await
			.unwrap();

		let first = storage.list_bytes("users/sam@shop.com/orders").await.unwrap();
		let second = storage.list_bytes("users/sam_shop_com/orders").await.unwrap();
		assert_eq!(first, vec![("r1".to_string(), b"vanilla".to_vec())]);
		assert_eq!(second, vec![("r1".to_string(), b"coffee".to_vec())]);
		assert!(storage.list_bytes("users/sam%40shop.com/orders").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_listed_ids_are_decoded() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage
			.set_bytes("ns", "order_1.a", b"1".to_vec())
			.await
			.unwrap();

		let listed = storage.list_bytes("ns").await.unwrap();
		assert_eq!(listed[0].0, "order_1.a");
		assert_eq!(storage.get_bytes("ns", "order_1.a").await.unwrap(), b"1".to_vec());
	}

	#[test]
	fn test_schema_rejects_empty_path() {
		let config: toml::Value = toml::from_str("storage_path = \"\"").unwrap();
		assert!(create_storage(&config).is_err());

		let config: toml::Value = toml::from_str("storage_path = \"./data\"").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
