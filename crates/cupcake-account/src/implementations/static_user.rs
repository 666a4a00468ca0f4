//! Sign-in as a fixed, configured user.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use async_trait::async_trait;
use cupcake_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, Session, ValidationError,
};

/// Account implementation that always signs in the same user.
///
/// An empty user id stands for a customer who declined to sign in.
pub struct StaticAccount {
	user_id: String,
	display_name: Option<String>,
}

impl StaticAccount {
	pub fn new(user_id: String, display_name: Option<String>) -> Self {
		Self {
			user_id,
			display_name,
		}
	}
}

#[async_trait]
impl AccountInterface for StaticAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(StaticAccountSchema)
	}

	async fn sign_in(&self) -> Result<Session, AccountError> {
		if self.user_id.is_empty() {
			return Ok(Session::signed_out());
		}
		Ok(Session::signed_in(
			self.user_id.clone(),
			self.display_name.clone(),
		))
	}
}

/// Configuration schema for StaticAccount.
pub struct StaticAccountSchema;

impl ConfigSchema for StaticAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("user_id", FieldType::String)],
			vec![Field::new("display_name", FieldType::String)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a static account from configuration.
///
/// Configuration parameters:
/// - `user_id`: id of the signed-in user, empty for a signed-out session
/// - `display_name`: optional name shown in the greeting
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	StaticAccountSchema
		.validate(config)
		.map_err(|e| AccountError::Configuration(e.to_string()))?;

	let user_id = config
		.get("user_id")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::Configuration("user_id is required".into()))?
		.to_string();
	let display_name = config
		.get("display_name")
		.and_then(|v| v.as_str())
		.map(str::to_string);

	Ok(Box::new(StaticAccount::new(user_id, display_name)))
}

/// Registry for the static account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "static";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_configured_user() {
		let config: toml::Value =
			toml::from_str("user_id = \"user-1\"\ndisplay_name = \"Sam\"").unwrap();
		let session = create_account(&config).unwrap().sign_in().await.unwrap();
		assert_eq!(session.user_id(), Some("user-1"));
		assert_eq!(session.greeting_name(), "Sam");
	}

	#[tokio::test]
	async fn test_empty_user_is_signed_out() {
		let config: toml::Value = toml::from_str("user_id = \"\"").unwrap();
		let session = create_account(&config).unwrap().sign_in().await.unwrap();
		assert!(!session.signed_in);
	}

	#[test]
	fn test_missing_user_id_rejected() {
		let config: toml::Value = toml::from_str("display_name = \"Sam\"").unwrap();
		assert!(matches!(
			create_account(&config),
			Err(AccountError::Configuration(_))
		));
	}
}
