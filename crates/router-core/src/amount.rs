//! Resolution of possibly relative input amounts.

use crate::ExecutionError;
use alloy_primitives::{Address, U256};
use router_ledger::BalanceOracle;
use router_types::{is_native, AmountType, TokenAmount, DELIMITER};

/// Converts `token_amount` into a concrete quantity held by `account`.
///
/// Absolute amounts are returned unchanged. Relative amounts are a share of
/// the account's current balance scaled by [`DELIMITER`]; a share of exactly
/// the delimiter yields the full balance with no rounding.
pub fn resolve_absolute_amount<O>(
	oracle: &O,
	token_amount: &TokenAmount,
	account: Address,
) -> Result<U256, ExecutionError>
where
	O: BalanceOracle + ?Sized,
{
	match token_amount.amount_type {
		AmountType::None => Err(ExecutionError::NoAmountType),
		AmountType::Absolute => Ok(token_amount.amount),
		AmountType::Relative => {
			if is_native(&token_amount.token) {
				return Err(ExecutionError::BadAmountType {
					got: AmountType::Relative,
					expected: AmountType::Absolute,
				});
			}
			if token_amount.amount > DELIMITER {
				return Err(ExecutionError::AmountOverLimit(token_amount.amount));
			}

			let balance = oracle.balance_of(token_amount.token, account);
			if token_amount.amount == DELIMITER {
				return Ok(balance);
			}
			balance
				.checked_mul(token_amount.amount)
				.map(|scaled| scaled / DELIMITER)
				.ok_or(ExecutionError::Overflow)
		},
	}
}
