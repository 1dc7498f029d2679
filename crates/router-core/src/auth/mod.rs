//! Authorization of delegated executions.
//!
//! A delegated intent carries a signature over its EIP-712 digest. The
//! hasher produces the digest, the recoverer turns digest and signature into
//! the signing address, and the replay guard makes sure a (digest, account)
//! pair authorizes at most one committed execution.

pub mod hasher;
pub mod replay;
pub mod signature;
