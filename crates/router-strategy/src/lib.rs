//! Pluggable execution strategies.
//!
//! A strategy is the untrusted component that turns an exact input amount
//! into output for the account, for example by trading against its own
//! inventory. The router treats it as adversarial: it only sees a
//! [`StrategyLedger`] scoped to its own address and the router re-reads
//! balances after every invocation instead of trusting anything it reports.

use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use router_ledger::{BalanceOracle, Ledger, LedgerError};
use router_types::{ConfigSchema, ImplementationRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

pub mod implementations {
	pub mod fixed_rate;
}

/// Errors that can occur in strategies.
#[derive(Debug, Error)]
pub enum StrategyError {
	#[error("Strategy failed: {0}")]
	Failed(String),
	#[error("Invalid call data: {0}")]
	InvalidCallData(String),
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Main invocation of a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyCall {
	/// Input amount the strategy has been given.
	pub exact_input: U256,
	/// Opaque call data from the intent.
	pub call_data: Bytes,
	/// Account that receives the output.
	pub account: Address,
}

/// Ledger handle given to a strategy.
///
/// Reads are unrestricted. Writes always act as the strategy's own address:
/// it can move its own funds and spend allowances granted to it, nothing else.
pub struct StrategyLedger<'a> {
	ledger: &'a mut Ledger,
	address: Address,
}

impl<'a> StrategyLedger<'a> {
	pub fn new(ledger: &'a mut Ledger, address: Address) -> Self {
		Self { ledger, address }
	}

	/// Address the handle acts as.
	pub fn address(&self) -> Address {
		self.address
	}

	pub fn balance_of(&self, asset: Address, account: Address) -> U256 {
		self.ledger.balance_of(asset, account)
	}

	pub fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
		self.ledger.allowance(asset, owner, spender)
	}

	/// Sends `amount` of `asset` from the strategy to `to`.
	pub fn transfer(&mut self, asset: Address, to: Address, amount: U256) -> Result<(), StrategyError> {
		Ok(self.ledger.transfer(asset, self.address, to, amount)?)
	}

	/// Balance of `asset` the strategy last accounted for.
	pub fn reserve(&self, asset: Address) -> U256 {
		self.ledger.reserve_of(asset, self.address)
	}

	/// Accounts for the strategy's current balance of `asset`.
	pub fn sync_reserve(&mut self, asset: Address) {
		self.ledger.sync_reserve(asset, self.address);
	}

	/// Spends an allowance granted to the strategy.
	pub fn transfer_from(
		&mut self,
		asset: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), StrategyError> {
		Ok(self
			.ledger
			.transfer_from(asset, self.address, from, to, amount)?)
	}

	/// Grants `spender` an allowance over the strategy's balance.
	pub fn approve(&mut self, asset: Address, spender: Address, amount: U256) {
		self.ledger.approve(asset, self.address, spender, amount);
	}
}

/// Interface of strategy implementations.
#[async_trait]
pub trait StrategyInterface: Send + Sync {
	/// Returns the configuration schema for this strategy implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address intents name to select this strategy.
	fn address(&self) -> Address;

	/// Performs the swap for `call.exact_input`, already delivered to the
	/// strategy or its destination.
	async fn execute(
		&self,
		ledger: &mut StrategyLedger<'_>,
		call: StrategyCall,
	) -> Result<(), StrategyError>;

	/// Dry run for fixed-output swaps: returns the ABI-encoded input amount
	/// needed to satisfy `call_data`.
	async fn exact_input_amount(
		&self,
		ledger: &StrategyLedger<'_>,
		call_data: &Bytes,
	) -> Result<Bytes, StrategyError>;
}

/// Factory function building a strategy from its TOML table.
pub type StrategyFactory = fn(&toml::Value) -> Result<Box<dyn StrategyInterface>, StrategyError>;

/// Registry trait for strategy implementations.
pub trait StrategyRegistry: ImplementationRegistry<Factory = StrategyFactory> {}

/// Returns `(name, factory)` for every strategy implementation.
pub fn get_all_implementations() -> Vec<(&'static str, StrategyFactory)> {
	use implementations::fixed_rate;

	vec![(fixed_rate::Registry::NAME, fixed_rate::Registry::factory())]
}

/// Strategies known to the router, keyed by address.
#[derive(Default, Clone)]
pub struct StrategyService {
	strategies: HashMap<Address, Arc<dyn StrategyInterface>>,
}

impl StrategyService {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a strategy; fails if its address is taken.
	pub fn register(&mut self, strategy: Box<dyn StrategyInterface>) -> Result<(), StrategyError> {
		let address = strategy.address();
		if self.strategies.contains_key(&address) {
			return Err(StrategyError::Configuration(format!(
				"Duplicate strategy address {}",
				address
			)));
		}
		self.strategies.insert(address, Arc::from(strategy));
		Ok(())
	}

	pub fn get(&self, address: &Address) -> Option<Arc<dyn StrategyInterface>> {
		self.strategies.get(address).cloned()
	}

	pub fn addresses(&self) -> Vec<Address> {
		let mut addresses: Vec<_> = self.strategies.keys().copied().collect();
		addresses.sort();
		addresses
	}

	pub fn is_empty(&self) -> bool {
		self.strategies.is_empty()
	}
}
