//! Serializable initial ledger state.
//!
//! Used by the CLI and tests to describe balances, allowances and permit
//! support in JSON instead of a sequence of ledger calls.

use crate::{Ledger, LedgerError};
use alloy_primitives::{Address, U256};
use router_types::PermitType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
	pub asset: Address,
	pub holder: Address,
	pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceEntry {
	pub asset: Address,
	pub owner: Address,
	pub spender: Address,
	pub amount: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitEntry {
	pub asset: Address,
	pub permit_type: PermitType,
}

/// Initial state of a [`Ledger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerGenesis {
	#[serde(default)]
	pub balances: Vec<BalanceEntry>,
	#[serde(default)]
	pub allowances: Vec<AllowanceEntry>,
	#[serde(default)]
	pub permits: Vec<PermitEntry>,
}

impl LedgerGenesis {
	/// Builds the ledger; repeated balance entries accumulate.
	pub fn build(&self) -> Result<Ledger, LedgerError> {
		let mut ledger = Ledger::new();
		for entry in &self.balances {
			ledger.mint(entry.asset, entry.holder, entry.amount)?;
		}
		for entry in &self.allowances {
			ledger.approve(entry.asset, entry.owner, entry.spender, entry.amount);
		}
		for entry in &self.permits {
			ledger.enable_permit(entry.asset, entry.permit_type);
		}
		Ok(ledger)
	}
}
