//! Storage-related types for the cupcake shop.

use std::str::FromStr;

/// Top-level collections in the document store.
///
/// This enum replaces string literals in storage calls with strongly typed
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Root collection holding one document per user.
	Users,
	/// Per-user subcollection of submitted order records.
	Orders,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Users => "users",
			StorageKey::Orders => "orders",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Users, Self::Orders].into_iter()
	}

	/// Namespace of the order records owned by `user_id`: `users/{uid}/orders`.
	pub fn orders_of(user_id: &str) -> String {
		format!(
			"{}/{}/{}",
			StorageKey::Users.as_str(),
			user_id,
			StorageKey::Orders.as_str()
		)
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"users" => Ok(Self::Users),
			"orders" => Ok(Self::Orders),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_orders_namespace() {
		assert_eq!(StorageKey::orders_of("abc"), "users/abc/orders");
	}

	#[test]
	fn test_round_trip_names() {
		for key in StorageKey::all() {
			assert_eq!(key.as_str().parse::<StorageKey>(), Ok(key));
		}
		assert!("quotes".parse::<StorageKey>().is_err());
	}
}
