//! Selector lookup for permit calls.
//!
//! The permit payload in an intent is forwarded unmodified; the router only
//! prefixes it with the selector of the matching permit function.

use crate::ExecutionError;
use alloy_primitives::Bytes;
use alloy_sol_types::SolCall;
use router_types::standards::permit::{IDaiPermit, IEip2612Permit, IYearnPermit};
use router_types::{Permit, PermitType};

/// Function selector of the permit call for `permit_type`.
pub fn selector_for(permit_type: PermitType) -> Result<[u8; 4], ExecutionError> {
	match permit_type {
		PermitType::None => Err(ExecutionError::NoPermitType),
		PermitType::Eip2612 => Ok(IEip2612Permit::permitCall::SELECTOR),
		PermitType::Dai => Ok(IDaiPermit::permitCall::SELECTOR),
		PermitType::Yearn => Ok(IYearnPermit::permitCall::SELECTOR),
	}
}

/// Full call data: selector followed by the intent's permit payload.
pub fn encode_permit_call(permit: &Permit) -> Result<Bytes, ExecutionError> {
	let selector = selector_for(permit.permit_type)?;
	let mut call = Vec::with_capacity(4 + permit.permit_call_data.len());
	call.extend_from_slice(&selector);
	call.extend_from_slice(&permit.permit_call_data);
	Ok(call.into())
}
