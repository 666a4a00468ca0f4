//! Storage module for the cupcake shop.
//!
//! This module provides the document store that order records are appended
//! to. Records live in namespaces (collection paths such as
//! `users/{uid}/orders`) and are never updated or removed once written.

use async_trait::async_trait;
use cupcake_types::{ConfigSchema, ImplementationRegistry};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when writing a document id that is already taken.
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Documents are raw bytes addressed by a namespace and an id. Backends only
/// need to create, read and enumerate documents; there is no delete or
/// update path.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves the bytes of one document.
	async fn get_bytes(&self, namespace: &str, id: &str) -> Result<Vec<u8>, StorageError>;

	/// Writes one document. Fails with `AlreadyExists` if the id is taken.
	async fn set_bytes(&self, namespace: &str, id: &str, value: Vec<u8>)
		-> Result<(), StorageError>;

	/// Checks if a document exists.
	async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError>;

	/// Returns every document of a namespace as `(id, bytes)` pairs.
	///
	/// An unknown namespace yields an empty list.
	async fn list_bytes(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must provide
/// to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
///
/// This trait extends the base ImplementationRegistry to specify that
/// storage implementations must provide a StorageFactory.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage implementations.
/// This is used by the factory registry to automatically register all implementations.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed data with
/// automatic JSON serialization.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Appends a new document to a namespace and returns its generated id.
	pub async fn append<T: Serialize>(
		&self,
		namespace: &str,
		data: &T,
	) -> Result<String, StorageError> {
		let id = uuid::Uuid::new_v4().to_string();
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(namespace, &id, bytes).await?;
		Ok(id)
	}

	/// Retrieves and deserializes one document.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(namespace, id).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves and deserializes every document of a namespace.
	///
	/// A single undecodable document fails the whole call.
	pub async fn list<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<(String, T)>, StorageError> {
		self.backend
			.list_bytes(namespace)
			.await?
			.into_iter()
			.map(|(id, bytes)| {
				serde_json::from_slice(&bytes)
					.map(|value| (id, value))
					.map_err(|e| StorageError::Serialization(e.to_string()))
			})
			.collect()
	}

	/// Checks if a document exists.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(namespace, id).await
	}
}
