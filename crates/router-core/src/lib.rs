//! Core execution engine of the intent router.
//!
//! An execution intent is authorized either directly by its account or by a
//! detached EIP-712 signature, then executed atomically against the shared
//! ledger: fee validation, amount resolution, input transfer (through a permit
//! when the allowance is short), an untrusted strategy call, and finally the
//! balance-delta checks that decide whether the whole execution is committed.
//!
//! The [`builder::RouterBuilder`] assembles a [`Router`] from configuration
//! and the storage and strategy factories.

use alloy_primitives::{Address, B256, U256};
use router_ledger::LedgerError;
use router_storage::StorageError;
use router_types::AmountType;
use thiserror::Error;

pub mod amount;
pub mod auth;
pub mod builder;
pub mod engine;
pub mod fee;
pub mod permit;

pub use auth::hasher::{AuthorizationHasher, TypedStruct};
pub use auth::replay::ReplayGuard;
pub use auth::signature::{recover_signer, SignatureError};
pub use builder::{BuilderError, RouterBuilder, RouterFactories};
pub use engine::{event_bus::EventBus, Router};

/// Errors that abort an execution.
///
/// Any error leaves the ledger and the replay set exactly as they were before
/// the call.
#[derive(Debug, Error)]
pub enum ExecutionError {
	#[error("Fee beneficiary must be set when the fee share is non-zero")]
	ZeroBeneficiary,
	#[error("Fee share {0} exceeds the limit")]
	FeeShareExceedsCap(U256),
	#[error("Amount type is not set")]
	NoAmountType,
	#[error("Bad amount type: got {got}, expected {expected}")]
	BadAmountType { got: AmountType, expected: AmountType },
	#[error("Relative amount {0} exceeds the delimiter")]
	AmountOverLimit(U256),
	#[error("Exact input {exact} exceeds absolute input {absolute}")]
	ExactInputExceedsAbsolute { exact: U256, absolute: U256 },
	#[error("Insufficient native value: sent {sent}, required {required}")]
	InsufficientValue { sent: U256, required: U256 },
	#[error("Native value {0} attached to a non-native input")]
	UnexpectedValue(U256),
	#[error("Input delta {delta} exceeds absolute input {absolute}")]
	InputDeltaExceedsAbsolute { delta: U256, absolute: U256 },
	#[error("Output delta {delta} below required {required}")]
	OutputBelowRequired { delta: U256, required: U256 },
	#[error("Signer mismatch: recovered {recovered}, claimed {claimed}")]
	SignerMismatch { recovered: Address, claimed: Address },
	#[error("Authorization {digest} already used by {account}")]
	ReplayError { digest: B256, account: Address },
	#[error("Swap type is not set")]
	NoSwapType,
	#[error("Permit type is not set")]
	NoPermitType,
	#[error("Dry run returned {0} bytes, expected at least 32")]
	BadDryRunResponse(usize),
	#[error("Signature error: {0}")]
	Signature(#[from] SignatureError),
	#[error("Router is already executing")]
	Reentrancy,
	#[error("Router is busy with another call")]
	Busy,
	#[error("Caller {0} is not authorized")]
	Unauthorized(Address),
	#[error("Unknown strategy {0}")]
	UnknownStrategy(Address),
	#[error("Strategy failed: {0}")]
	Strategy(String),
	#[error("Ledger error: {0}")]
	Ledger(#[from] LedgerError),
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Arithmetic overflow")]
	Overflow,
}

impl From<StorageError> for ExecutionError {
	fn from(err: StorageError) -> Self {
		ExecutionError::Storage(err.to_string())
	}
}
