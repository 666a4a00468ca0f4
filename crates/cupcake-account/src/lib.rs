//! Account management module for the cupcake shop.
//!
//! This module provides abstractions for signing a customer in when the shop
//! starts. The identity provider itself is external; implementations only have
//! to produce a `Session` naming the user whose order history is read and
//! written.

use async_trait::async_trait;
use cupcake_types::{truncate_id, ConfigSchema, ImplementationRegistry, Session};
use thiserror::Error;
use tracing::instrument;

/// Re-export implementations
pub mod implementations {
	pub mod anonymous;
	pub mod static_user;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when the identity provider rejects or aborts sign-in.
	#[error("Sign-in failed: {0}")]
	SignInFailed(String),
	/// Error that occurs when the implementation settings are invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Trait defining the interface for account implementations.
///
/// This trait must be implemented by any identity provider that wants to
/// integrate with the shop.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	///
	/// This allows each implementation to define its own configuration requirements
	/// with specific validation rules. The schema is used to validate TOML configuration
	/// before initializing the account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Runs the sign-in flow and returns the resulting session.
	async fn sign_in(&self) -> Result<Session, AccountError>;
}

/// Type alias for account factory functions.
///
/// This is the function signature that all account implementations must provide
/// to create instances of their account interface.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
///
/// This trait extends the base ImplementationRegistry to specify that
/// account implementations must provide an AccountFactory.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
///
/// Returns a vector of (name, factory) tuples for all available account implementations.
/// This is used by the factory registry to automatically register all implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::{anonymous, static_user};

	vec![
		(anonymous::Registry::NAME, anonymous::Registry::factory()),
		(static_user::Registry::NAME, static_user::Registry::factory()),
	]
}

/// Service that manages sign-in.
///
/// This struct provides a high-level interface for account management,
/// wrapping an underlying account implementation.
pub struct AccountService {
	/// The underlying account implementation.
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	/// Creates a new AccountService with the specified implementation.
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Signs the customer in.
	///
	/// Sign-in failures are not fatal: they are logged and yield a signed-out
	/// session, in which order history is neither saved nor listed.
	#[instrument(skip_all)]
	pub async fn sign_in(&self) -> Session {
		match self.implementation.sign_in().await {
			Ok(session) => {
				match session.user_id() {
					Some(user_id) => tracing::info!(
						user_id = %truncate_id(user_id),
						name = %session.greeting_name(),
						"Signed in"
					),
					None => tracing::info!("Continuing without sign-in"),
				}
				session
			},
			Err(e) => {
				tracing::warn!(error = %e, "Sign-in failed, continuing signed out");
				Session::signed_out()
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use cupcake_types::{Schema, ValidationError};

	struct FailingAccount;

	struct NoSchema;

	impl ConfigSchema for NoSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	#[async_trait]
	impl AccountInterface for FailingAccount {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn sign_in(&self) -> Result<Session, AccountError> {
			Err(AccountError::SignInFailed("provider unavailable".into()))
		}
	}

	#[tokio::test]
	async fn test_failed_sign_in_yields_signed_out_session() {
		let service = AccountService::new(Box::new(FailingAccount));
		let session = service.sign_in().await;
		assert!(!session.signed_in);
		assert_eq!(session.user_id(), None);
	}

	#[tokio::test]
	async fn test_sign_in_passes_session_through() {
		let service = AccountService::new(Box::new(
			implementations::static_user::StaticAccount::new("user-42".into(), Some("Ada".into())),
		));
		let session = service.sign_in().await;
		assert_eq!(session.user_id(), Some("user-42"));
		assert_eq!(session.greeting_name(), "Ada");
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations().into_iter().map(|(n, _)| n).collect();
		assert_eq!(names, vec!["anonymous", "static"]);
	}
}
