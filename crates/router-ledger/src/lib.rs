//! Ledger of asset balances for the intent router.
//!
//! The router never talks to asset contracts directly. It reads balances
//! through the [`BalanceOracle`] trait and moves funds on a [`Ledger`], an
//! in-memory model of token contracts (balances, allowances and permit
//! support) plus native currency balances keyed by
//! [`NATIVE_ASSET`](router_types::NATIVE_ASSET).

use alloy_primitives::{Address, U256};
use router_types::PermitType;
use std::sync::Arc;
use thiserror::Error;

pub mod genesis;
mod ledger;
mod permit;

pub use genesis::LedgerGenesis;
pub use ledger::Ledger;

/// Errors raised by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
	#[error("Insufficient balance of {asset} for {holder}: have {balance}, need {required}")]
	InsufficientBalance {
		asset: Address,
		holder: Address,
		balance: U256,
		required: U256,
	},
	#[error("Insufficient allowance of {asset} from {owner} to {spender}: have {allowance}, need {required}")]
	InsufficientAllowance {
		asset: Address,
		owner: Address,
		spender: Address,
		allowance: U256,
		required: U256,
	},
	#[error("Asset {asset} does not support {permit_type:?} permits")]
	PermitNotSupported {
		asset: Address,
		permit_type: PermitType,
	},
	#[error("Invalid permit call: {0}")]
	InvalidPermit(String),
	#[error("Balance overflow")]
	Overflow,
}

/// Read access to current balances and allowances.
///
/// Implementations must reflect the state of the ledger at the moment of the
/// call; nothing is cached.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait BalanceOracle: Send + Sync {
	/// Balance of `account` in `asset`; native currency when `asset` is the native pseudo-address.
	fn balance_of(&self, asset: Address, account: Address) -> U256;

	/// Amount `spender` may move out of `owner`'s balance of `asset`.
	fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256;
}

/// Ledger shared between the router and its callers.
pub type SharedLedger = Arc<tokio::sync::Mutex<Ledger>>;

/// Wraps a ledger for sharing.
pub fn shared(ledger: Ledger) -> SharedLedger {
	Arc::new(tokio::sync::Mutex::new(ledger))
}
