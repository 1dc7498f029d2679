//! Configuration builder for test and development setups.

use crate::{
	AccountConfig, Config, DomainConfig, RouterConfig, StorageConfig, StrategiesConfig,
};
use alloy_primitives::{Address, U256};
use router_types::DEFAULT_FEE_LIMIT;
use std::collections::HashMap;

/// Well-known development key (first account of the default local test mnemonic).
pub const DEV_PRIVATE_KEY: &str =
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for `Config` instances backed by in-memory storage and a local account.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	router_id: String,
	address: Address,
	owner: Address,
	fee_limit: U256,
	chain_id: u64,
	private_key: String,
	strategies: HashMap<String, toml::Value>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			router_id: "test-router".to_string(),
			address: Address::repeat_byte(0x10),
			owner: Address::repeat_byte(0x0a),
			fee_limit: DEFAULT_FEE_LIMIT,
			chain_id: 31337,
			private_key: DEV_PRIVATE_KEY.to_string(),
			strategies: HashMap::new(),
		}
	}

	pub fn router_id(mut self, id: impl Into<String>) -> Self {
		self.router_id = id.into();
		self
	}

	pub fn address(mut self, address: Address) -> Self {
		self.address = address;
		self
	}

	pub fn owner(mut self, owner: Address) -> Self {
		self.owner = owner;
		self
	}

	pub fn fee_limit(mut self, fee_limit: U256) -> Self {
		self.fee_limit = fee_limit;
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	pub fn private_key(mut self, private_key: impl Into<String>) -> Self {
		self.private_key = private_key.into();
		self
	}

	/// Adds a `fixed_rate` strategy instance.
	pub fn fixed_rate_strategy(
		mut self,
		name: impl Into<String>,
		address: Address,
		input_token: Address,
		output_token: Address,
		rate: U256,
	) -> Self {
		let mut table = toml::Table::new();
		table.insert("implementation".into(), "fixed_rate".into());
		table.insert("address".into(), address.to_string().into());
		table.insert("input_token".into(), input_token.to_string().into());
		table.insert("output_token".into(), output_token.to_string().into());
		table.insert("rate".into(), rate.to_string().into());
		self.strategies.insert(name.into(), toml::Value::Table(table));
		self
	}

	pub fn build(self) -> Config {
		let mut account = toml::Table::new();
		account.insert("private_key".into(), self.private_key.into());

		Config {
			router: RouterConfig {
				id: self.router_id,
				address: self.address,
				owner: self.owner,
				fee_limit: self.fee_limit,
			},
			domain: DomainConfig {
				name: "Intent Router".to_string(),
				version: "1".to_string(),
				chain_id: self.chain_id,
			},
			storage: StorageConfig {
				primary: "memory".to_string(),
				implementations: HashMap::from([(
					"memory".to_string(),
					toml::Value::Table(toml::Table::new()),
				)]),
			},
			account: AccountConfig {
				primary: "local".to_string(),
				implementations: HashMap::from([(
					"local".to_string(),
					toml::Value::Table(account),
				)]),
			},
			strategies: StrategiesConfig {
				implementations: self.strategies,
			},
		}
	}
}
