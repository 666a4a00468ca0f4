//! Dynamic factory registry for shop implementations.
//!
//! Collects the factory of every storage backend, account implementation and
//! remote config source once, so the engine can be built from whatever the
//! configuration file names.

use cupcake_account::AccountFactory;
use cupcake_catalog::RemoteConfigFactory;
use cupcake_config::Config;
use cupcake_core::{ShopBuilder, ShopEngine, ShopFactories};
use cupcake_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub account: HashMap<String, AccountFactory>,
	pub catalog: HashMap<String, RemoteConfigFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			account: HashMap::new(),
			catalog: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}

	pub fn register_catalog(&mut self, name: impl Into<String>, factory: RemoteConfigFactory) {
		self.catalog.insert(name.into(), factory);
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global registry, registering all available implementations on
/// first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in cupcake_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in cupcake_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		for (name, factory) in cupcake_catalog::get_all_implementations() {
			tracing::debug!("Registering catalog implementation: {}", name);
			registry.register_catalog(name, factory);
		}

		registry
	})
}

/// Picks the factories named by one config section, rejecting unknown names.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Build the shop engine using the registry and config.
pub async fn build_shop_from_config(
	config: Config,
) -> Result<ShopEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations, storage, "storage");
	let account_factories =
		build_factories!(registry, config.account.implementations, account, "account");
	let catalog_factories =
		build_factories!(registry, config.catalog.implementations, catalog, "catalog");

	let factories = ShopFactories {
		storage_factories,
		account_factories,
		catalog_factories,
	};

	Ok(ShopBuilder::new(config).build(factories).await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use cupcake_config::builders::config::ConfigBuilder;

	#[test]
	fn test_registry_lists_all_implementations() {
		let registry = get_registry();
		for name in ["memory", "file"] {
			assert!(registry.storage.contains_key(name));
		}
		for name in ["anonymous", "static"] {
			assert!(registry.account.contains_key(name));
		}
		for name in ["static", "file", "http"] {
			assert!(registry.catalog.contains_key(name));
		}
	}

	#[tokio::test]
	async fn test_unknown_implementation_is_rejected() {
		let config = ConfigBuilder::new().storage_primary("redis").build();
		let err = build_shop_from_config(config).await.err().unwrap();
		assert!(err.to_string().contains("Unknown storage implementation 'redis'"));
		assert!(err.to_string().contains("file, memory"));
	}

	#[tokio::test]
	async fn test_builds_engine() {
		let engine = build_shop_from_config(ConfigBuilder::new().build())
			.await
			.unwrap();
		assert_eq!(engine.config().account.primary, "anonymous");
	}
}
