//! Configuration module for the intent router.
//!
//! Configuration is loaded from TOML files. String values may reference
//! environment variables as `${VAR}` or `${VAR:-default}`, and the loaded
//! configuration is validated before it is handed to the builder.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(feature = "testing")]
pub mod builders;
mod loader;

pub use loader::ConfigLoader;

use alloy_primitives::{Address, U256};
use regex::Regex;
use router_types::{Eip712Domain, DEFAULT_FEE_LIMIT, DELIMITER};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity and protocol parameters of this router instance.
	pub router: RouterConfig,
	/// Signing domain of delegated authorizations.
	pub domain: DomainConfig,
	/// Storage backend holding replay marks and outcome records.
	pub storage: StorageConfig,
	/// Accounts able to produce delegated signatures.
	pub account: AccountConfig,
	/// Strategies the router may invoke.
	pub strategies: StrategiesConfig,
}

/// Identity and protocol parameters of the router.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouterConfig {
	/// Identifier used in logs.
	pub id: String,
	/// Address of the router itself; verifying contract of the signing domain
	/// and holder of native currency in flight.
	pub address: Address,
	/// Account allowed to recover stray assets.
	pub owner: Address,
	/// Upper bound for the fee share, scaled by the delimiter.
	#[serde(
		default = "default_fee_limit",
		deserialize_with = "deserialize_amount"
	)]
	pub fee_limit: U256,
}

fn default_fee_limit() -> U256 {
	DEFAULT_FEE_LIMIT
}

/// EIP-712 domain parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DomainConfig {
	#[serde(default = "default_domain_name")]
	pub name: String,
	#[serde(default = "default_domain_version")]
	pub version: String,
	pub chain_id: u64,
}

fn default_domain_name() -> String {
	"Intent Router".to_string()
}

fn default_domain_version() -> String {
	"1".to_string()
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for strategies.
///
/// Every entry builds one strategy instance. The entry key names the
/// implementation unless the table carries an explicit `implementation`
/// field, which allows several instances of the same implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategiesConfig {
	pub implementations: HashMap<String, toml::Value>,
}

impl StrategiesConfig {
	/// Returns `(instance name, implementation name, table)` for every entry.
	pub fn instances(&self) -> impl Iterator<Item = (&str, &str, &toml::Value)> {
		self.implementations.iter().map(|(name, value)| {
			let implementation = value
				.get("implementation")
				.and_then(|v| v.as_str())
				.unwrap_or(name.as_str());
			(name.as_str(), implementation, value)
		})
	}
}

/// Accepts either a TOML integer or a decimal / `0x` hex string.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Raw {
		Int(u64),
		Str(String),
	}

	match Raw::deserialize(deserializer)? {
		Raw::Int(v) => Ok(U256::from(v)),
		Raw::Str(s) => s
			.parse::<U256>()
			.map_err(|e| de::Error::custom(format!("invalid amount '{}': {}", s, e))),
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;
		loader.load_config(file_name).await
	}

	/// Signing domain derived from the `[domain]` section and the router address.
	pub fn eip712_domain(&self) -> Eip712Domain {
		Eip712Domain::new(
			self.domain.name.clone(),
			self.domain.version.clone(),
			self.domain.chain_id,
			self.router.address,
		)
	}

	/// Validates cross-field constraints that serde cannot express.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.router.id.is_empty() {
			return Err(ConfigError::Validation("Router ID cannot be empty".into()));
		}
		if self.router.address == Address::ZERO {
			return Err(ConfigError::Validation(
				"Router address cannot be the zero address".into(),
			));
		}
		if self.router.owner == Address::ZERO {
			return Err(ConfigError::Validation(
				"Router owner cannot be the zero address".into(),
			));
		}
		if self.router.fee_limit > DELIMITER {
			return Err(ConfigError::Validation(format!(
				"fee_limit {} exceeds the delimiter {}",
				self.router.fee_limit, DELIMITER
			)));
		}

		if self.domain.name.is_empty() || self.domain.version.is_empty() {
			return Err(ConfigError::Validation(
				"Domain name and version cannot be empty".into(),
			));
		}
		if self.domain.chain_id == 0 {
			return Err(ConfigError::Validation(
				"Domain chain_id must be greater than 0".into(),
			));
		}

		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;

		validate_primary("account", &self.account.primary, &self.account.implementations)?;

		if self.strategies.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one strategy implementation required".into(),
			));
		}
		for (name, value) in &self.strategies.implementations {
			if !value.is_table() {
				return Err(ConfigError::Validation(format!(
					"Strategy '{}' must be a table",
					name
				)));
			}
		}

		Ok(())
	}
}

fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
