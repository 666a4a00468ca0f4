//! Configuration builder for creating test and development configurations.
//!
//! This module provides utilities for constructing Config instances with
//! sensible defaults, particularly useful for testing scenarios.

use crate::{
	AccountConfig, CatalogSourceConfig, Config, HistoryConfig, PricingConfig, ShopConfig,
	StorageConfig,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Builder for creating `Config` instances with a fluent API.
///
/// Every primary gets an empty implementation table, so the built config
/// passes validation as long as the named backends need no settings.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	shop_id: String,
	account_primary: String,
	account_settings: toml::Table,
	catalog_primary: String,
	catalog_settings: toml::Table,
	min_fetch_interval_seconds: u64,
	fetch_timeout_seconds: u64,
	storage_primary: String,
	pricing: PricingConfig,
	list_timeout_seconds: u64,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	/// Creates a new `ConfigBuilder` with default values suitable for testing.
	pub fn new() -> Self {
		Self {
			shop_id: "test-shop".to_string(),
			account_primary: "anonymous".to_string(),
			account_settings: toml::Table::new(),
			catalog_primary: "static".to_string(),
			catalog_settings: toml::Table::new(),
			min_fetch_interval_seconds: 10,
			fetch_timeout_seconds: 10,
			storage_primary: "memory".to_string(),
			pricing: PricingConfig::default(),
			list_timeout_seconds: 10,
		}
	}

	/// Sets the shop ID.
	pub fn shop_id(mut self, id: impl Into<String>) -> Self {
		self.shop_id = id.into();
		self
	}

	/// Sets the primary account implementation and its settings.
	pub fn account(mut self, primary: impl Into<String>, settings: toml::Table) -> Self {
		self.account_primary = primary.into();
		self.account_settings = settings;
		self
	}

	/// Sets the primary remote config source and its settings.
	pub fn catalog(mut self, primary: impl Into<String>, settings: toml::Table) -> Self {
		self.catalog_primary = primary.into();
		self.catalog_settings = settings;
		self
	}

	/// Sets the catalog fetch cooldown in seconds.
	pub fn min_fetch_interval_seconds(mut self, seconds: u64) -> Self {
		self.min_fetch_interval_seconds = seconds;
		self
	}

	/// Sets the catalog fetch timeout in seconds.
	pub fn fetch_timeout_seconds(mut self, seconds: u64) -> Self {
		self.fetch_timeout_seconds = seconds;
		self
	}

	/// Sets the primary storage implementation.
	pub fn storage_primary(mut self, primary: impl Into<String>) -> Self {
		self.storage_primary = primary.into();
		self
	}

	/// Sets the base unit price.
	pub fn unit_price(mut self, price: Decimal) -> Self {
		self.pricing.unit_price = price;
		self
	}

	/// Adds a per-flavor unit price override.
	pub fn flavor_price(mut self, flavor: impl Into<String>, price: Decimal) -> Self {
		self.pricing.flavor_prices.insert(flavor.into(), price);
		self
	}

	/// Sets the number of pickup days offered.
	pub fn pickup_days(mut self, days: u32) -> Self {
		self.pricing.pickup_days = days;
		self
	}

	/// Sets the history retrieval timeout in seconds.
	pub fn list_timeout_seconds(mut self, seconds: u64) -> Self {
		self.list_timeout_seconds = seconds;
		self
	}

	/// Builds the `Config` with the configured values.
	pub fn build(self) -> Config {
		Config {
			shop: ShopConfig {
				id: self.shop_id,
				event_capacity: 256,
			},
			account: AccountConfig {
				implementations: single(&self.account_primary, self.account_settings),
				primary: self.account_primary,
			},
			catalog: CatalogSourceConfig {
				implementations: single(&self.catalog_primary, self.catalog_settings),
				primary: self.catalog_primary,
				min_fetch_interval_seconds: self.min_fetch_interval_seconds,
				fetch_timeout_seconds: self.fetch_timeout_seconds,
			},
			pricing: self.pricing,
			storage: StorageConfig {
				implementations: single(&self.storage_primary, toml::Table::new()),
				primary: self.storage_primary,
			},
			history: HistoryConfig {
				list_timeout_seconds: self.list_timeout_seconds,
			},
		}
	}
}

fn single(name: &str, settings: toml::Table) -> HashMap<String, toml::Value> {
	HashMap::from([(name.to_string(), toml::Value::Table(settings))])
}
