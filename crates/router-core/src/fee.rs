//! Fee validation and computation.
//!
//! Fixed-input swaps take the fee as the residual between the resolved input
//! and what the strategy receives. Fixed-output swaps charge a share of the
//! exact input, capped by the headroom left in the resolved input.

use crate::ExecutionError;
use alloy_primitives::{Address, U256};
use router_types::{Fee, SwapDescription, SwapType, DELIMITER};

/// A non-zero share needs a beneficiary and must not exceed `limit`.
pub fn validate_fee(fee: &Fee, limit: U256) -> Result<(), ExecutionError> {
	if fee.share.is_zero() {
		return Ok(());
	}
	if fee.beneficiary == Address::ZERO {
		return Err(ExecutionError::ZeroBeneficiary);
	}
	if fee.share > limit {
		return Err(ExecutionError::FeeShareExceedsCap(fee.share));
	}
	Ok(())
}

/// Exact input of a fixed-input swap: `absolute * DELIMITER / (DELIMITER + share)`.
pub fn exact_input_for_fixed_inputs(absolute: U256, share: U256) -> Result<U256, ExecutionError> {
	if share.is_zero() {
		return Ok(absolute);
	}
	let denominator = DELIMITER
		.checked_add(share)
		.ok_or(ExecutionError::Overflow)?;
	absolute
		.checked_mul(DELIMITER)
		.map(|scaled| scaled / denominator)
		.ok_or(ExecutionError::Overflow)
}

/// Fee charged for a swap whose exact input has been determined.
pub fn fee_amount(
	absolute_input: U256,
	exact_input: U256,
	swap: &SwapDescription,
) -> Result<U256, ExecutionError> {
	let headroom = absolute_input.checked_sub(exact_input).ok_or(
		ExecutionError::ExactInputExceedsAbsolute {
			exact: exact_input,
			absolute: absolute_input,
		},
	)?;

	match swap.swap_type {
		SwapType::FixedInputs => Ok(headroom),
		SwapType::FixedOutputs => {
			let share = exact_input
				.checked_mul(swap.fee.share)
				.map(|scaled| scaled / DELIMITER)
				.ok_or(ExecutionError::Overflow)?;
			Ok(share.min(headroom))
		},
		SwapType::None => Err(ExecutionError::NoSwapType),
	}
}
