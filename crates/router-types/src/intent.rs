//! Execution intent types for the router.
//!
//! An [`ExecutionIntent`] is the complete description of one value transfer:
//! what is taken from the account, what the account must receive, which
//! strategy produces the output and how the fee is charged. The same structure
//! is hashed for delegated signatures, so every field here is part of what a
//! signer authorizes.

use alloy_primitives::{address, Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pseudo-address identifying the native currency.
pub const NATIVE_ASSET: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Fixed-point scale for relative amounts and fee shares (1.0 = 100%).
pub const DELIMITER: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Default upper bound for the fee share (1%).
pub const DEFAULT_FEE_LIMIT: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Returns true if the asset identifies the native currency.
pub fn is_native(asset: &Address) -> bool {
	*asset == NATIVE_ASSET
}

/// How the amount of a [`TokenAmount`] is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AmountType {
	/// Unset.
	#[default]
	None,
	/// The amount is a concrete quantity.
	Absolute,
	/// The amount is a fraction of the holder's balance scaled by [`DELIMITER`].
	Relative,
}

impl AmountType {
	/// ABI discriminant used in structured hashing.
	pub fn as_u8(&self) -> u8 {
		match self {
			AmountType::None => 0,
			AmountType::Absolute => 1,
			AmountType::Relative => 2,
		}
	}
}

impl fmt::Display for AmountType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AmountType::None => write!(f, "none"),
			AmountType::Absolute => write!(f, "absolute"),
			AmountType::Relative => write!(f, "relative"),
		}
	}
}

/// Which side of the swap is held constant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SwapType {
	/// Unset.
	#[default]
	None,
	/// The resolved input amount is fixed; the fee is the residual.
	FixedInputs,
	/// The output amount is fixed; the strategy reports the required input.
	FixedOutputs,
}

impl SwapType {
	/// ABI discriminant used in structured hashing.
	pub fn as_u8(&self) -> u8 {
		match self {
			SwapType::None => 0,
			SwapType::FixedInputs => 1,
			SwapType::FixedOutputs => 2,
		}
	}
}

impl fmt::Display for SwapType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SwapType::None => write!(f, "none"),
			SwapType::FixedInputs => write!(f, "fixed_inputs"),
			SwapType::FixedOutputs => write!(f, "fixed_outputs"),
		}
	}
}

/// Authorization-bypass scheme supported by an asset contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermitType {
	/// No permit available.
	#[default]
	None,
	/// EIP-2612 `permit` with an explicit value.
	Eip2612,
	/// DAI-style `permit` with an `allowed` flag.
	Dai,
	/// Yearn-style `permit` with a packed signature.
	Yearn,
}

impl PermitType {
	/// ABI discriminant used in structured hashing.
	pub fn as_u8(&self) -> u8 {
		match self {
			PermitType::None => 0,
			PermitType::Eip2612 => 1,
			PermitType::Dai => 2,
			PermitType::Yearn => 3,
		}
	}
}

/// An amount of a single asset, possibly relative to the holder's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
	pub token: Address,
	pub amount: U256,
	pub amount_type: AmountType,
}

/// Pre-signed authorization used when the existing allowance is insufficient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permit {
	pub permit_type: PermitType,
	/// ABI-encoded arguments of the permit call, without the selector.
	#[serde(default)]
	pub permit_call_data: Bytes,
}

/// What is taken from the initiating account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
	pub token_amount: TokenAmount,
	#[serde(default)]
	pub permit: Permit,
}

/// The minimum the account must receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsoluteTokenAmount {
	pub token: Address,
	pub absolute_amount: U256,
}

/// Fee charged on the input, as a share of [`DELIMITER`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
	pub share: U256,
	pub beneficiary: Address,
}

/// Parameters of the swap performed by the strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapDescription {
	pub swap_type: SwapType,
	#[serde(default)]
	pub fee: Fee,
	/// Receiver of the exact input amount for non-native inputs.
	pub destination: Address,
	/// Address of the strategy invoked with the exact input amount.
	pub strategy: Address,
	/// Opaque call data forwarded to the strategy.
	#[serde(default)]
	pub strategy_call_data: Bytes,
}

/// The payload that gets hashed and optionally signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionIntent {
	pub input: Input,
	pub output: AbsoluteTokenAmount,
	pub swap_description: SwapDescription,
	/// Account whose funds are moved and who receives the output.
	pub account: Address,
	/// Distinguishes otherwise identical intents.
	#[serde(default)]
	pub salt: U256,
}

/// Call-level context of an execution: who is calling and what native value is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallContext {
	pub caller: Address,
	#[serde(default)]
	pub value: U256,
}

impl CallContext {
	/// Creates a call context without attached native value.
	pub fn new(caller: Address) -> Self {
		Self {
			caller,
			value: U256::ZERO,
		}
	}

	/// Attaches native value to the call.
	pub fn with_value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}
}
