//! Permit handling of the simulated asset contracts.

use crate::{Ledger, LedgerError};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use router_types::standards::permit::{IDaiPermit, IEip2612Permit, IYearnPermit};
use router_types::PermitType;

/// Allowance grant carried by a decoded permit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grant {
	owner: Address,
	spender: Address,
	amount: U256,
}

fn decode(permit_type: PermitType, call_data: &[u8]) -> Result<Grant, LedgerError> {
	let invalid = |e: alloy_sol_types::Error| LedgerError::InvalidPermit(e.to_string());
	match permit_type {
		PermitType::Eip2612 => {
			let call = IEip2612Permit::permitCall::abi_decode(call_data, true).map_err(invalid)?;
			Ok(Grant {
				owner: call.owner,
				spender: call.spender,
				amount: call.value,
			})
		},
		PermitType::Dai => {
			let call = IDaiPermit::permitCall::abi_decode(call_data, true).map_err(invalid)?;
			Ok(Grant {
				owner: call.holder,
				spender: call.spender,
				amount: if call.allowed { U256::MAX } else { U256::ZERO },
			})
		},
		PermitType::Yearn => {
			let call = IYearnPermit::permitCall::abi_decode(call_data, true).map_err(invalid)?;
			Ok(Grant {
				owner: call.owner,
				spender: call.spender,
				amount: call.amount,
			})
		},
		PermitType::None => Err(LedgerError::InvalidPermit("no permit scheme".into())),
	}
}

impl Ledger {
	/// Applies a permit call (selector followed by ABI-encoded arguments) to `asset`.
	///
	/// The asset must accept the permit scheme the call is encoded for. The
	/// call sets the allowance of the decoded spender over the decoded owner's
	/// balance; signature checks belong to the asset contract and are not
	/// modelled.
	pub fn permit(&mut self, asset: Address, call_data: &[u8]) -> Result<(), LedgerError> {
		let scheme = self.permit_scheme(asset);
		if scheme == PermitType::None {
			return Err(LedgerError::PermitNotSupported {
				asset,
				permit_type: scheme,
			});
		}

		let grant = decode(scheme, call_data)?;
		tracing::debug!(
			asset = %asset,
			owner = %grant.owner,
			spender = %grant.spender,
			amount = %grant.amount,
			"Permit applied"
		);
		self.approve(asset, grant.owner, grant.spender, grant.amount);
		Ok(())
	}
}
