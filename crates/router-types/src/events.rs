//! Event types published by the router.
//!
//! Events are emitted only after an operation has been committed; a failed
//! execution never produces an event.

use crate::SwapType;
use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome record of a committed execution.
///
/// Carries both the amounts the intent authorized and the balance deltas the
/// router actually observed, together with the swap parameters and the two
/// parties involved (the authorizing account and the caller that submitted it).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
	pub input_token: Address,
	pub absolute_input_amount: U256,
	pub actual_input_delta: U256,
	pub output_token: Address,
	pub absolute_output_amount: U256,
	pub actual_output_delta: U256,
	pub swap_type: SwapType,
	pub fee_share: U256,
	pub fee_beneficiary: Address,
	pub destination: Address,
	pub strategy: Address,
	pub account: Address,
	pub caller: Address,
}

/// Stored record of a committed execution, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReceipt {
	pub id: Uuid,
	/// EIP-712 digest of the executed intent.
	pub digest: B256,
	/// Whether the intent was authorized by signature rather than by its account.
	pub delegated: bool,
	pub executed_at: DateTime<Utc>,
	pub outcome: ExecutionOutcome,
}

/// Main event type encompassing all router events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RouterEvent {
	/// An intent was executed and committed.
	Executed(ExecutionOutcome),
	/// Stray assets held by the router were sent to a beneficiary.
	TokensReturned {
		asset: Address,
		beneficiary: Address,
		amount: U256,
	},
}
