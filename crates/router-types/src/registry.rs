//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Every pluggable implementation module (storage backends, accounts,
/// strategies) exposes a `Registry` type implementing this trait, naming the
/// key used for it in configuration (`storage.implementations.file`,
/// `account.implementations.local`, `strategies.implementations.fixed_rate`)
/// and handing out its factory function.
pub trait ImplementationRegistry {
	/// Configuration key of the implementation.
	const NAME: &'static str;

	/// Factory function type of the owning module.
	type Factory;

	/// Returns the factory that builds the implementation from its TOML table.
	fn factory() -> Self::Factory;
}
