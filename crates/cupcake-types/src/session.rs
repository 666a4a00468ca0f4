//! Session types produced by sign-in.

use serde::{Deserialize, Serialize};

/// Outcome of signing in with the identity provider.
///
/// The user id is opaque; nothing in the shop inspects provider tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	pub signed_in: bool,
	pub user_id: String,
	pub display_name: Option<String>,
}

impl Session {
	pub fn signed_in(user_id: impl Into<String>, display_name: Option<String>) -> Self {
		Self {
			signed_in: true,
			user_id: user_id.into(),
			display_name,
		}
	}

	/// A session without an authenticated user. Saves under it are no-ops.
	pub fn signed_out() -> Self {
		Self::default()
	}

	/// The user id when a user is signed in.
	pub fn user_id(&self) -> Option<&str> {
		if self.signed_in && !self.user_id.is_empty() {
			Some(&self.user_id)
		} else {
			None
		}
	}

	/// Name used in the greeting on the start screen.
	pub fn greeting_name(&self) -> &str {
		self.display_name.as_deref().unwrap_or("")
	}
}
