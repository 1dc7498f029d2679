//! Registry of every implementation factory compiled into the binary.
//!
//! The builder receives these maps and picks implementations by the names
//! used in the configuration file.

use router_account::{AccountFactory, AccountService};
use router_config::Config;
use router_core::{builder::build_account, BuilderError, Router, RouterBuilder, RouterFactories};
use router_ledger::SharedLedger;
use router_storage::StorageFactory;
use router_strategy::StrategyFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub account: HashMap<String, AccountFactory>,
	pub strategy: HashMap<String, StrategyFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			account: HashMap::new(),
			strategy: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}

	pub fn register_strategy(&mut self, name: impl Into<String>, factory: StrategyFactory) {
		self.strategy.insert(name.into(), factory);
	}

	/// Factory maps in the shape the router builder expects.
	pub fn router_factories(&self) -> RouterFactories<StorageFactory, StrategyFactory> {
		RouterFactories {
			storage_factories: self.storage.clone(),
			strategy_factories: self.strategy.clone(),
		}
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Initializes the global registry with all available implementations.
pub fn initialize_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in router_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in router_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		for (name, factory) in router_strategy::get_all_implementations() {
			tracing::debug!("Registering strategy implementation: {}", name);
			registry.register_strategy(name, factory);
		}

		registry
	})
}

/// Builds a router from configuration, executing against `ledger`.
pub fn build_router(config: Config, ledger: SharedLedger) -> Result<Router, BuilderError> {
	let registry = initialize_registry();
	RouterBuilder::new(config)
		.with_ledger(ledger)
		.build(registry.router_factories())
}

/// Builds the configured signing account.
pub fn build_signer(config: &Config) -> Result<AccountService, BuilderError> {
	build_account(config, &initialize_registry().account)
}
