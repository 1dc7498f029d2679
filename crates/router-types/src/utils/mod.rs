//! Utility functions for structured-data encoding and hex formatting.

pub mod eip712;
pub mod formatting;

pub use eip712::{
	compute_domain_hash, compute_final_digest, Eip712AbiEncoder, Eip712Domain, DOMAIN_TYPE,
};
pub use formatting::{truncate_id, without_0x_prefix};
