//! Permit call shapes accepted by asset contracts.
//!
//! The router never builds the arguments of these calls itself: it only
//! prefixes the caller-supplied payload with the selector matching the
//! permit type. The full definitions are kept so the ledger can decode the
//! calls it receives.

use alloy_sol_types::sol;

sol! {
	/// EIP-2612 permit.
	interface IEip2612Permit {
		function permit(address owner, address spender, uint256 value, uint256 deadline, uint8 v, bytes32 r, bytes32 s) external;
	}

	/// DAI-style permit granting or revoking an unlimited allowance.
	interface IDaiPermit {
		function permit(address holder, address spender, uint256 nonce, uint256 expiry, bool allowed, uint8 v, bytes32 r, bytes32 s) external;
	}

	/// Yearn-style permit with a packed signature.
	interface IYearnPermit {
		function permit(address owner, address spender, uint256 amount, uint256 expiry, bytes signature) external returns (bool);
	}
}
