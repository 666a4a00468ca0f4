//! Anonymous sign-in.
//!
//! Every start of the shop gets a fresh random user id, so history is only
//! visible within one run unless the storage backend persists it.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use async_trait::async_trait;
use cupcake_types::{ConfigSchema, ImplementationRegistry, Schema, Session, ValidationError};

/// Account implementation issuing a random v4 UUID user id.
pub struct AnonymousAccount;

#[async_trait]
impl AccountInterface for AnonymousAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AnonymousAccountSchema)
	}

	async fn sign_in(&self) -> Result<Session, AccountError> {
		Ok(Session::signed_in(uuid::Uuid::new_v4().to_string(), None))
	}
}

/// Configuration schema for AnonymousAccount.
pub struct AnonymousAccountSchema;

impl ConfigSchema for AnonymousAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

/// Factory function to create an anonymous account from configuration.
///
/// Configuration parameters:
/// - None
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	AnonymousAccountSchema
		.validate(config)
		.map_err(|e| AccountError::Configuration(e.to_string()))?;
	Ok(Box::new(AnonymousAccount))
}

/// Registry for the anonymous account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "anonymous";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}
