//! Signing accounts for delegated authorizations.
//!
//! An account owns a secp256k1 key and signs EIP-712 digests produced by the
//! router's hasher. The resulting 65-byte `r || s || v` signatures are what
//! `Router::execute_signed` accepts.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use router_types::{ConfigSchema, ImplementationRegistry};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Interface of account implementations.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address controlled by this account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest without any message prefix.
	///
	/// Returns `r || s || v` with `v` in `{27, 28}` and `s` in the lower half
	/// of the curve order.
	async fn sign_digest(&self, digest: &B256) -> Result<[u8; 65], AccountError>;
}

/// Factory function building an account from its TOML table.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Returns `(name, factory)` for every account implementation.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service wrapping the primary account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	pub async fn sign_digest(&self, digest: &B256) -> Result<[u8; 65], AccountError> {
		self.implementation.sign_digest(digest).await
	}
}
