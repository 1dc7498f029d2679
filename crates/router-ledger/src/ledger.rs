use crate::{BalanceOracle, LedgerError};
use alloy_primitives::{Address, U256};
use router_types::{PermitType, NATIVE_ASSET};
use std::collections::HashMap;

/// In-memory ledger.
///
/// Cloning a ledger yields an independent copy; the router executes against
/// such a copy and swaps it in only when the whole execution succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
	/// (asset, holder) -> balance
	balances: HashMap<(Address, Address), U256>,
	/// (asset, owner, spender) -> allowance
	allowances: HashMap<(Address, Address, Address), U256>,
	/// Permit scheme accepted by each asset.
	permit_schemes: HashMap<Address, PermitType>,
	/// (asset, holder) -> balance the holder has accounted for
	reserves: HashMap<(Address, Address), U256>,
}

impl Ledger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Credits newly created units of `asset` to `to`.
	///
	/// Minted units count as accounted for: they raise the holder's reserve
	/// together with its balance.
	pub fn mint(&mut self, asset: Address, to: Address, amount: U256) -> Result<(), LedgerError> {
		self.credit(asset, to, amount)?;
		let reserve = self.reserves.entry((asset, to)).or_default();
		*reserve = reserve.saturating_add(amount);
		Ok(())
	}

	/// Balance of `asset` that `holder` last accounted for.
	pub fn reserve_of(&self, asset: Address, holder: Address) -> U256 {
		self.reserves
			.get(&(asset, holder))
			.copied()
			.unwrap_or_default()
	}

	/// Sets the reserve of `holder` to its current balance.
	pub fn sync_reserve(&mut self, asset: Address, holder: Address) {
		let balance = self.balance_of(asset, holder);
		if balance.is_zero() {
			self.reserves.remove(&(asset, holder));
		} else {
			self.reserves.insert((asset, holder), balance);
		}
	}

	/// Sets the allowance of `spender` over `owner`'s balance of `asset`.
	pub fn approve(&mut self, asset: Address, owner: Address, spender: Address, amount: U256) {
		if amount.is_zero() {
			self.allowances.remove(&(asset, owner, spender));
		} else {
			self.allowances.insert((asset, owner, spender), amount);
		}
	}

	/// Declares which permit scheme `asset` accepts.
	pub fn enable_permit(&mut self, asset: Address, permit_type: PermitType) {
		if permit_type == PermitType::None {
			self.permit_schemes.remove(&asset);
		} else {
			self.permit_schemes.insert(asset, permit_type);
		}
	}

	pub fn permit_scheme(&self, asset: Address) -> PermitType {
		self.permit_schemes
			.get(&asset)
			.copied()
			.unwrap_or_default()
	}

	/// Moves `amount` of `asset` from `from` to `to`.
	pub fn transfer(
		&mut self,
		asset: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		if amount.is_zero() || from == to {
			return self.ensure_balance(asset, from, amount);
		}
		self.debit(asset, from, amount)?;
		self.credit(asset, to, amount)
	}

	/// Moves native currency.
	pub fn transfer_native(
		&mut self,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		self.transfer(NATIVE_ASSET, from, to, amount)
	}

	/// Moves `amount` of `asset` out of `from` on behalf of `spender`,
	/// consuming allowance. An allowance of `U256::MAX` is never consumed.
	pub fn transfer_from(
		&mut self,
		asset: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), LedgerError> {
		let allowance = self.allowance(asset, from, spender);
		if allowance < amount {
			return Err(LedgerError::InsufficientAllowance {
				asset,
				owner: from,
				spender,
				allowance,
				required: amount,
			});
		}
		self.transfer(asset, from, to, amount)?;
		if allowance != U256::MAX {
			self.approve(asset, from, spender, allowance - amount);
		}
		Ok(())
	}

	/// Non-zero balances of `holder`, ordered by asset.
	pub fn holdings(&self, holder: Address) -> Vec<(Address, U256)> {
		let mut holdings: Vec<_> = self
			.balances
			.iter()
			.filter(|((_, h), amount)| *h == holder && !amount.is_zero())
			.map(|((asset, _), amount)| (*asset, *amount))
			.collect();
		holdings.sort();
		holdings
	}

	fn ensure_balance(&self, asset: Address, holder: Address, amount: U256) -> Result<(), LedgerError> {
		let balance = self.balance_of(asset, holder);
		if balance < amount {
			return Err(LedgerError::InsufficientBalance {
				asset,
				holder,
				balance,
				required: amount,
			});
		}
		Ok(())
	}

	fn credit(&mut self, asset: Address, holder: Address, amount: U256) -> Result<(), LedgerError> {
		let balance = self.balances.entry((asset, holder)).or_default();
		*balance = balance.checked_add(amount).ok_or(LedgerError::Overflow)?;
		Ok(())
	}

	fn debit(&mut self, asset: Address, holder: Address, amount: U256) -> Result<(), LedgerError> {
		self.ensure_balance(asset, holder, amount)?;
		let balance = self.balances.entry((asset, holder)).or_default();
		*balance -= amount;
		if balance.is_zero() {
			self.balances.remove(&(asset, holder));
		}
		Ok(())
	}
}

impl BalanceOracle for Ledger {
	fn balance_of(&self, asset: Address, account: Address) -> U256 {
		self.balances
			.get(&(asset, account))
			.copied()
			.unwrap_or_default()
	}

	fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
		self.allowances
			.get(&(asset, owner, spender))
			.copied()
			.unwrap_or_default()
	}
}
