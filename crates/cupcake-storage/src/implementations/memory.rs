//! In-memory storage backend implementation for the cupcake shop.
//!
//! This module provides a memory-based implementation of the StorageInterface trait,
//! useful for testing and development scenarios where persistence is not required.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use cupcake_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Documents of one namespace, ordered by id.
type Collection = BTreeMap<String, Vec<u8>>;

/// In-memory storage implementation.
///
/// This implementation stores data in a HashMap of collections in memory,
/// providing fast access but no persistence across restarts.
pub struct MemoryStorage {
	/// The in-memory store protected by a read-write lock.
	store: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, namespace: &str, id: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store
			.get(namespace)
			.and_then(|collection| collection.get(id))
			.cloned()
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		namespace: &str,
		id: &str,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		let collection = store.entry(namespace.to_string()).or_default();
		if collection.contains_key(id) {
			return Err(StorageError::AlreadyExists(format!("{}/{}", namespace, id)));
		}
		collection.insert(id.to_string(), value);
		Ok(())
	}

	async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(namespace)
			.is_some_and(|collection| collection.contains_key(id)))
	}

	async fn list_bytes(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.get(namespace)
			.map(|collection| {
				collection
					.iter()
					.map(|(id, bytes)| (id.clone(), bytes.clone()))
					.collect()
			})
			.unwrap_or_default())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - None required for memory storage
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;
	Ok(Box::new(MemoryStorage::new()))
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		let value = b"test_value".to_vec();
		storage.set_bytes("ns", "key", value.clone()).await.unwrap();

		let retrieved = storage.get_bytes("ns", "key").await.unwrap();
		assert_eq!(retrieved, value);

		assert!(storage.exists("ns", "key").await.unwrap());
		assert!(!storage.exists("other", "key").await.unwrap());

		let result = storage.get_bytes("ns", "missing").await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_no_overwrite() {
		let storage = MemoryStorage::new();

		storage.set_bytes("ns", "key", b"value1".to_vec()).await.unwrap();
		let result = storage.set_bytes("ns", "key", b"value2".to_vec()).await;
		assert!(matches!(result, Err(StorageError::AlreadyExists(_))));

		// First write is kept
		let retrieved = storage.get_bytes("ns", "key").await.unwrap();
		assert_eq!(retrieved, b"value1".to_vec());
	}

	#[tokio::test]
	async fn test_list_bytes() {
		let storage = MemoryStorage::new();
		storage.set_bytes("ns", "b", b"2".to_vec()).await.unwrap();
		storage.set_bytes("ns", "a", b"1".to_vec()).await.unwrap();

		let listed = storage.list_bytes("ns").await.unwrap();
		assert_eq!(
			listed,
			vec![("a".to_string(), b"1".to_vec()), ("b".to_string(), b"2".to_vec())]
		);
		assert!(storage.list_bytes("empty").await.unwrap().is_empty());
	}

	#[test]
	fn test_factory_rejects_non_table() {
		let result = create_storage(&toml::Value::String("memory".into()));
		assert!(matches!(result, Err(StorageError::Configuration(_))));
	}
}
