//! Configuration module for the cupcake shop.
//!
//! This module provides structures and utilities for managing shop configuration.
//! It supports loading configuration from TOML files and provides validation to ensure
//! all required configuration values are properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files for better organization:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Included files may include further files, resolved next to the including file
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(any(test, feature = "testing"))]
pub mod builders {
	pub mod config;
}
mod loader;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
pub use builders::config::ConfigBuilder;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the cupcake shop.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this shop instance.
	pub shop: ShopConfig,
	/// Identity provider used at start-up sign-in.
	pub account: AccountConfig,
	/// Remote config sources backing the catalog.
	pub catalog: CatalogSourceConfig,
	/// Price table and pickup window.
	#[serde(default)]
	pub pricing: PricingConfig,
	/// Document store backends.
	pub storage: StorageConfig,
	/// Order history retrieval settings.
	#[serde(default)]
	pub history: HistoryConfig,
}

/// Configuration specific to the shop instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShopConfig {
	/// Unique identifier for this shop instance.
	pub id: String,
	/// Capacity of the event bus channel.
	#[serde(default = "default_event_capacity")]
	pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
	256
}

/// Configuration for sign-in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the remote catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSourceConfig {
	/// Which remote config source to use as primary.
	pub primary: String,
	/// Map of remote config source names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Minimum seconds between two fetches against the remote source.
	#[serde(default = "default_min_fetch_interval_seconds")]
	pub min_fetch_interval_seconds: u64,
	/// Seconds before a fetch is abandoned and the fallback is served.
	#[serde(default = "default_fetch_timeout_seconds")]
	pub fetch_timeout_seconds: u64,
}

/// Returns the default cooldown between remote config fetches.
fn default_min_fetch_interval_seconds() -> u64 {
	10
}

/// Returns the default remote config fetch timeout.
fn default_fetch_timeout_seconds() -> u64 {
	10
}

/// Price table applied while the order is configured.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
	/// Price of one cupcake when the flavor has no override.
	#[serde(default = "default_unit_price")]
	pub unit_price: Decimal,
	/// Per-flavor unit price overrides.
	#[serde(default)]
	pub flavor_prices: HashMap<String, Decimal>,
	/// Flat amount added when the pickup date is today.
	#[serde(default = "default_same_day_surcharge")]
	pub same_day_surcharge: Decimal,
	/// Multiplier applied to the subtotal while the catalog discount toggle is on.
	#[serde(default = "default_discount_multiplier")]
	pub discount_multiplier: Decimal,
	/// Number of pickup dates offered, starting today.
	#[serde(default = "default_pickup_days")]
	pub pickup_days: u32,
}

fn default_unit_price() -> Decimal {
	Decimal::new(200, 2) // 2.00
}

fn default_same_day_surcharge() -> Decimal {
	Decimal::new(300, 2) // 3.00
}

fn default_discount_multiplier() -> Decimal {
	Decimal::new(9, 1) // 0.9
}

fn default_pickup_days() -> u32 {
	4
}

impl Default for PricingConfig {
	fn default() -> Self {
		Self {
			unit_price: default_unit_price(),
			flavor_prices: HashMap::new(),
			same_day_surcharge: default_same_day_surcharge(),
			discount_multiplier: default_discount_multiplier(),
			pickup_days: default_pickup_days(),
		}
	}
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for order history retrieval.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
	/// Seconds before a history retrieval is abandoned.
	#[serde(default = "default_list_timeout_seconds")]
	pub list_timeout_seconds: u64,
}

fn default_list_timeout_seconds() -> u64 {
	10
}

impl Default for HistoryConfig {
	fn default() -> Self {
		Self {
			list_timeout_seconds: default_list_timeout_seconds(),
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)));
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables and includes.
	///
	/// Each top-level section must be unique across all configuration files.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration to ensure all required fields are properly set.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.shop.id.is_empty() {
			return Err(ConfigError::Validation("Shop ID cannot be empty".into()));
		}
		if self.shop.event_capacity == 0 {
			return Err(ConfigError::Validation(
				"Shop event_capacity must be greater than 0".into(),
			));
		}

		validate_primary("account", &self.account.primary, &self.account.implementations)?;
		validate_primary("catalog", &self.catalog.primary, &self.catalog.implementations)?;
		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;

		if self.catalog.min_fetch_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"Catalog min_fetch_interval_seconds must be greater than 0".into(),
			));
		}
		if self.catalog.fetch_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Catalog fetch_timeout_seconds must be greater than 0".into(),
			));
		}
		if self.history.list_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"History list_timeout_seconds must be greater than 0".into(),
			));
		}

		self.validate_pricing()?;

		Ok(())
	}

	fn validate_pricing(&self) -> Result<(), ConfigError> {
		let pricing = &self.pricing;

		if pricing.unit_price.is_sign_negative() {
			return Err(ConfigError::Validation(
				"Pricing unit_price cannot be negative".into(),
			));
		}
		if pricing.same_day_surcharge.is_sign_negative() {
			return Err(ConfigError::Validation(
				"Pricing same_day_surcharge cannot be negative".into(),
			));
		}
		for (flavor, price) in &pricing.flavor_prices {
			if price.is_sign_negative() {
				return Err(ConfigError::Validation(format!(
					"Price for flavor '{}' cannot be negative",
					flavor
				)));
			}
		}
		if pricing.discount_multiplier <= Decimal::ZERO || pricing.discount_multiplier > Decimal::ONE
		{
			return Err(ConfigError::Validation(
				"Pricing discount_multiplier must be in (0, 1]".into(),
			));
		}
		if pricing.pickup_days == 0 {
			return Err(ConfigError::Validation(
				"Pricing pickup_days must be at least 1".into(),
			));
		}

		Ok(())
	}
}

/// Checks that a section has implementations and that its primary is one of them.
fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved and the configuration is validated
/// after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
