//! Builder pattern for constructing shop engines.
//!
//! Composes a ShopEngine from the configured storage backend, account
//! implementation and remote config source, each created by a factory
//! function looked up by the name used in the configuration file.

use crate::engine::ShopEngine;
use cupcake_account::{AccountError, AccountInterface, AccountService};
use cupcake_catalog::{CatalogError, CatalogProvider, RemoteConfigInterface};
use cupcake_config::Config;
use cupcake_storage::{StorageError, StorageInterface, StorageService};
use cupcake_types::{Clock, EventBus, SystemClock};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during shop engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for all factory functions needed to build a ShopEngine.
///
/// Each map goes from implementation name to a factory taking that
/// implementation's TOML table.
pub struct ShopFactories<SF, AF, CF> {
	pub storage_factories: HashMap<String, SF>,
	pub account_factories: HashMap<String, AF>,
	pub catalog_factories: HashMap<String, CF>,
}

/// Builder for constructing a ShopEngine with pluggable implementations.
pub struct ShopBuilder {
	config: Config,
	clock: Option<Arc<dyn Clock>>,
}

impl ShopBuilder {
	/// Creates a new ShopBuilder with the given configuration.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: None,
		}
	}

	/// Replaces the system clock, e.g. to pin "today" in tests.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);
		self
	}

	/// Builds the ShopEngine using factories for each component type.
	pub async fn build<SF, AF, CF>(
		self,
		factories: ShopFactories<SF, AF, CF>,
	) -> Result<ShopEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
		CF: Fn(&toml::Value) -> Result<Box<dyn RemoteConfigInterface>, CatalogError>,
	{
		let storage_backend = load_primary(
			"storage",
			&self.config.storage.implementations,
			&self.config.storage.primary,
			&factories.storage_factories,
		)?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let account_impl = load_primary(
			"account",
			&self.config.account.implementations,
			&self.config.account.primary,
			&factories.account_factories,
		)?;
		let account = Arc::new(AccountService::new(account_impl));

		let catalog_source = load_primary(
			"catalog",
			&self.config.catalog.implementations,
			&self.config.catalog.primary,
			&factories.catalog_factories,
		)?;
		let catalog = Arc::new(CatalogProvider::new(
			catalog_source,
			Duration::from_secs(self.config.catalog.min_fetch_interval_seconds),
			Duration::from_secs(self.config.catalog.fetch_timeout_seconds),
		));

		let event_bus = EventBus::new(self.config.shop.event_capacity);
		let clock = self
			.clock
			.unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

		Ok(ShopEngine::new(
			self.config,
			account,
			catalog,
			storage,
			event_bus,
			clock,
		))
	}
}

/// Creates every configured implementation of one component that has a
/// factory, and returns the primary one.
///
/// Any factory failure aborts the build, including for non-primary entries.
fn load_primary<T, E, F>(
	component: &str,
	implementations: &HashMap<String, toml::Value>,
	primary: &str,
	factories: &HashMap<String, F>,
) -> Result<T, BuilderError>
where
	E: Display,
	F: Fn(&toml::Value) -> Result<T, E>,
{
	let mut loaded = HashMap::new();
	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered, skipping");
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				// Validation already happened in the factory
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				loaded.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create {} implementation",
					component
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if loaded.is_empty() {
		return Err(BuilderError::MissingComponent(format!(
			"No valid {} implementations available",
			component
		)));
	}

	loaded.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has invalid configuration",
			component, primary
		))
	})
}
