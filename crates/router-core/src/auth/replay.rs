//! Permanent record of consumed delegated authorizations.

use crate::ExecutionError;
use alloy_primitives::{Address, B256};
use router_storage::{StorageError, StorageService};
use router_types::StorageKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Stored value of a replay mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsedAuthorization {
	pub digest: B256,
	pub account: Address,
	/// Unix timestamp of the commit that consumed the authorization.
	pub used_at: i64,
}

/// Set of (digest, account) pairs that already authorized an execution.
///
/// Marks live in the permanent `used_authorizations` namespace and are never
/// removed. Check-and-mark runs under one lock and relies on the backend's
/// create-only insert, so a pair can be marked at most once.
pub struct ReplayGuard {
	storage: Arc<StorageService>,
	lock: Mutex<()>,
}

fn mark_id(digest: &B256, account: &Address) -> String {
	format!("{:#x}_{:#x}", digest, account)
}

impl ReplayGuard {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			lock: Mutex::new(()),
		}
	}

	pub async fn is_used(&self, digest: &B256, account: &Address) -> Result<bool, ExecutionError> {
		let _lock = self.lock.lock().await;
		Ok(self
			.storage
			.exists(
				StorageKey::UsedAuthorizations.as_str(),
				&mark_id(digest, account),
			)
			.await?)
	}

	/// Marks the pair as used; fails with [`ExecutionError::ReplayError`] if it already was.
	pub async fn mark_used(&self, digest: &B256, account: &Address) -> Result<(), ExecutionError> {
		let _lock = self.lock.lock().await;
		let record = UsedAuthorization {
			digest: *digest,
			account: *account,
			used_at: chrono::Utc::now().timestamp(),
		};

		match self
			.storage
			.insert(
				StorageKey::UsedAuthorizations.as_str(),
				&mark_id(digest, account),
				&record,
			)
			.await
		{
			Ok(()) => {
				tracing::debug!(digest = %digest, account = %account, "Authorization marked used");
				Ok(())
			},
			Err(StorageError::AlreadyExists(_)) => Err(ExecutionError::ReplayError {
				digest: *digest,
				account: *account,
			}),
			Err(e) => Err(e.into()),
		}
	}
}
