//! Registry trait for self-registering implementations.
//!
//! Every pluggable backend (storage, account, remote config source) exposes a
//! `Registry` struct implementing this trait, so the service binary can collect
//! the name and factory of each one without hardcoding constructors.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `[storage.implementations.memory]` or "http" for
	/// `[catalog.implementations.http]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
