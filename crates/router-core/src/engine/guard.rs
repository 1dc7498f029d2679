//! Re-entry protection for router entry points.
//!
//! A router runs one entry point at a time. A second call arriving from
//! inside a running one (a strategy calling back into the router) is
//! re-entry; any other overlapping call finds the router busy.

use crate::ExecutionError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

static NEXT_GUARD_ID: AtomicU64 = AtomicU64::new(0);

tokio::task_local! {
	/// Guards whose protected section the current task is running inside.
	static ACTIVE: Vec<u64>;
}

/// Flag set while an entry point of the router is running.
#[derive(Debug)]
pub struct ReentrancyGuard {
	id: u64,
	entered: AtomicBool,
}

/// Clears the flag when dropped, on success and failure alike.
#[must_use]
pub struct EntryGuard<'a> {
	flag: &'a AtomicBool,
}

impl Default for ReentrancyGuard {
	fn default() -> Self {
		Self {
			id: NEXT_GUARD_ID.fetch_add(1, Ordering::Relaxed),
			entered: AtomicBool::new(false),
		}
	}
}

impl ReentrancyGuard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the flag.
	///
	/// Fails with [`ExecutionError::Reentrancy`] when called from inside
	/// [`ReentrancyGuard::scope`] of this guard, and with
	/// [`ExecutionError::Busy`] when another caller holds the flag.
	pub fn enter(&self) -> Result<EntryGuard<'_>, ExecutionError> {
		if self.is_current() {
			return Err(ExecutionError::Reentrancy);
		}
		self.entered
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.map_err(|_| ExecutionError::Busy)?;
		Ok(EntryGuard {
			flag: &self.entered,
		})
	}

	/// Runs `fut` as the protected section of this guard.
	pub async fn scope<F: Future>(&self, fut: F) -> F::Output {
		let mut active = ACTIVE.try_with(|active| active.clone()).unwrap_or_default();
		active.push(self.id);
		ACTIVE.scope(active, fut).await
	}

	pub fn is_entered(&self) -> bool {
		self.entered.load(Ordering::Acquire)
	}

	fn is_current(&self) -> bool {
		ACTIVE
			.try_with(|active| active.contains(&self.id))
			.unwrap_or(false)
	}
}

impl Drop for EntryGuard<'_> {
	fn drop(&mut self) {
		self.flag.store(false, Ordering::Release);
	}
}
