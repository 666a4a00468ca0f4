//! Sink for refreshed push notification tokens.

use cupcake_types::truncate_id;
use std::sync::Mutex;

/// Remembers the most recent push token. Nothing downstream consumes it.
#[derive(Debug, Default)]
pub struct PushTokenRegistrar {
	last_token: Mutex<Option<String>>,
}

impl PushTokenRegistrar {
	pub fn new() -> Self {
		Self::default()
	}

	/// Called whenever the messaging service issues a new token.
	pub fn on_new_token(&self, token: impl Into<String>) {
		let token = token.into();
		tracing::debug!(token = %truncate_id(&token), "Refreshed push token");
		match self.last_token.lock() {
			Ok(mut last) => *last = Some(token),
			Err(poisoned) => *poisoned.into_inner() = Some(token),
		}
	}

	pub fn last_token(&self) -> Option<String> {
		match self.last_token.lock() {
			Ok(last) => last.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_keeps_latest_token() {
		let registrar = PushTokenRegistrar::new();
		assert_eq!(registrar.last_token(), None);

		registrar.on_new_token("first-token-value");
		registrar.on_new_token("second-token-value");
		assert_eq!(registrar.last_token().as_deref(), Some("second-token-value"));
	}
}
