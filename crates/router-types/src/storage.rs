//! Storage namespaces used by the router.

use std::str::FromStr;

/// Storage namespaces.
///
/// Keys are formed as `<namespace>:<id>`; backends may apply per-namespace
/// retention, but permanent namespaces must never expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// (digest, account) pairs consumed by delegated executions.
	UsedAuthorizations,
	/// Outcome records of committed executions.
	Outcomes,
}

impl StorageKey {
	/// Returns the string representation of the namespace.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::UsedAuthorizations => "used_authorizations",
			StorageKey::Outcomes => "outcomes",
		}
	}

	/// Whether entries in this namespace must be kept forever.
	pub fn is_permanent(&self) -> bool {
		matches!(self, StorageKey::UsedAuthorizations)
	}

	/// Returns an iterator over all namespaces.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::UsedAuthorizations, Self::Outcomes].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"used_authorizations" => Ok(Self::UsedAuthorizations),
			"outcomes" => Ok(Self::Outcomes),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_round_trip_names() {
		for key in StorageKey::all() {
			assert_eq!(key.as_str().parse::<StorageKey>(), Ok(key));
		}
		assert!("orders".parse::<StorageKey>().is_err());
	}

	#[test]
	fn test_permanence() {
		assert!(StorageKey::UsedAuthorizations.is_permanent());
		assert!(!StorageKey::Outcomes.is_permanent());
	}
}
