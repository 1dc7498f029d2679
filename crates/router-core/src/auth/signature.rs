//! secp256k1 signer recovery for delegated authorizations.
//!
//! Signatures are 65 bytes `r || s || v` with `v` in `{27, 28}`. Only the
//! low-s form is accepted, so each authorization has exactly one valid
//! encoding.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LENGTH: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
	#[error("Invalid signature length {0}, expected 65")]
	InvalidLength(usize),
	#[error("Invalid recovery id {0}")]
	InvalidRecoveryId(u8),
	#[error("Signature is not in canonical form")]
	NonCanonical,
	#[error("Recovery failed: {0}")]
	Recovery(String),
}

/// Recovers the address that signed `digest`.
///
/// The digest is used as-is; no message prefix is applied.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Result<Address, SignatureError> {
	if signature.len() != SIGNATURE_LENGTH {
		return Err(SignatureError::InvalidLength(signature.len()));
	}

	let v = signature[64];
	let recovery_id = match v {
		27 | 28 => RecoveryId::from_byte(v - 27),
		_ => None,
	}
	.ok_or(SignatureError::InvalidRecoveryId(v))?;

	// Rejects zero or out-of-range r and s.
	let signature =
		Signature::from_slice(&signature[..64]).map_err(|_| SignatureError::NonCanonical)?;
	if signature.normalize_s().is_some() {
		return Err(SignatureError::NonCanonical);
	}

	let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
		.map_err(|e| SignatureError::Recovery(e.to_string()))?;
	Ok(address_of(&key))
}

fn address_of(key: &VerifyingKey) -> Address {
	let point = key.to_encoded_point(false);
	let hash = keccak256(&point.as_bytes()[1..]);
	Address::from_slice(&hash[12..])
}
