//! Builder pattern for constructing routers.
//!
//! Storage backends and strategies are created from their configuration
//! tables through factory functions, so the binary decides which
//! implementations are available and tests can inject their own.

use crate::engine::{event_bus::EventBus, Router, RouterParams};
use router_account::{AccountError, AccountInterface, AccountService};
use router_config::Config;
use router_ledger::{shared, Ledger, SharedLedger};
use router_storage::{StorageError, StorageInterface, StorageService};
use router_strategy::{StrategyError, StrategyInterface, StrategyService};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Default capacity of the router's event channel.
const EVENT_CAPACITY: usize = 1000;

/// Errors that can occur during router construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct RouterFactories<SF, STF> {
	pub storage_factories: HashMap<String, SF>,
	pub strategy_factories: HashMap<String, STF>,
}

/// Builder for constructing a Router with pluggable implementations.
pub struct RouterBuilder {
	config: Config,
	ledger: Option<SharedLedger>,
	strategies: Vec<Box<dyn StrategyInterface>>,
	event_capacity: usize,
}

impl RouterBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			ledger: None,
			strategies: Vec::new(),
			event_capacity: EVENT_CAPACITY,
		}
	}

	/// Executes against an existing ledger instead of an empty one.
	pub fn with_ledger(mut self, ledger: SharedLedger) -> Self {
		self.ledger = Some(ledger);
		self
	}

	/// Registers a strategy in addition to the configured ones.
	pub fn with_strategy(mut self, strategy: Box<dyn StrategyInterface>) -> Self {
		self.strategies.push(strategy);
		self
	}

	pub fn with_event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	/// Builds the Router using factories for each component type.
	pub fn build<SF, STF>(self, factories: RouterFactories<SF, STF>) -> Result<Router, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		STF: Fn(&toml::Value) -> Result<Box<dyn StrategyInterface>, StrategyError>,
	{
		// Create storage implementations
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			if let Some(factory) = factories.storage_factories.get(name) {
				match factory(config) {
					Ok(implementation) => {
						storage_impls.insert(name.clone(), implementation);
						let is_primary = &self.config.storage.primary == name;
						tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					},
					Err(e) => {
						tracing::error!(
							component = "storage",
							implementation = %name,
							error = %e,
							"Failed to create storage implementation"
						);
						return Err(BuilderError::Config(format!(
							"Failed to create storage implementation '{}': {}",
							name, e
						)));
					},
				}
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		// Create strategies
		let mut strategies = StrategyService::new();
		for (name, implementation, config) in self.config.strategies.instances() {
			let factory = factories
				.strategy_factories
				.get(implementation)
				.ok_or_else(|| {
					BuilderError::Config(format!(
						"Unknown strategy implementation '{}' for '{}'",
						implementation, name
					))
				})?;

			let strategy = factory(config).map_err(|e| {
				tracing::error!(
					component = "strategy",
					implementation = %implementation,
					error = %e,
					"Failed to create strategy"
				);
				BuilderError::Config(format!("Failed to create strategy '{}': {}", name, e))
			})?;
			let address = strategy.address();
			strategies
				.register(strategy)
				.map_err(|e| BuilderError::Config(e.to_string()))?;
			tracing::info!(component = "strategy", implementation = %implementation, name = %name, address = %address, "Loaded");
		}
		for strategy in self.strategies {
			strategies
				.register(strategy)
				.map_err(|e| BuilderError::Config(e.to_string()))?;
		}
		if strategies.is_empty() {
			return Err(BuilderError::MissingComponent("strategy".into()));
		}

		let router = &self.config.router;
		let params = RouterParams {
			id: router.id.clone(),
			address: router.address,
			owner: router.owner,
			fee_limit: router.fee_limit,
		};

		Ok(Router::new(
			params,
			self.config.eip712_domain(),
			self.ledger.unwrap_or_else(|| shared(Ledger::new())),
			strategies,
			storage,
			EventBus::new(self.event_capacity),
		))
	}
}

/// Builds the primary signing account from configuration.
pub fn build_account<AF>(
	config: &Config,
	factories: &HashMap<String, AF>,
) -> Result<AccountService, BuilderError>
where
	AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
{
	let primary = &config.account.primary;
	let table = config.account.implementations.get(primary).ok_or_else(|| {
		BuilderError::Config(format!("Primary account '{}' is not configured", primary))
	})?;
	let factory = factories
		.get(primary)
		.ok_or_else(|| BuilderError::Config(format!("Unknown account implementation '{}'", primary)))?;

	match factory(table) {
		Ok(implementation) => {
			tracing::info!(component = "account", implementation = %primary, "Loaded");
			Ok(AccountService::new(implementation))
		},
		Err(e) => {
			tracing::error!(
				component = "account",
				implementation = %primary,
				error = %e,
				"Failed to create account implementation"
			);
			Err(BuilderError::Config(format!(
				"Failed to create account implementation '{}': {}",
				primary, e
			)))
		},
	}
}
