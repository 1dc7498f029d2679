//! Common types module for the intent router.
//!
//! This module defines the core data types shared by every router component:
//! the execution intent and its nested records, the outcome record emitted
//! after a successful execution, permit ABI definitions, storage namespaces
//! and the configuration validation framework used by pluggable implementations.

/// Events published by the router after state-changing operations.
pub mod events;
/// Execution intent data model and protocol constants.
pub mod intent;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secret string wrapper for private keys.
pub mod secret_string;
/// ABI definitions for external asset contracts.
pub mod standards;
/// Storage namespaces used by the router.
pub mod storage;
/// Utility functions for EIP-712 encoding and hex formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use events::*;
pub use intent::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use storage::*;
pub use utils::{truncate_id, without_0x_prefix, Eip712Domain};
pub use validation::*;

pub use alloy_primitives::{Address, Bytes, B256, U256};
