//! ABI definitions of external contracts the router talks to.

pub mod permit;
