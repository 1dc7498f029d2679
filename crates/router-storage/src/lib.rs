//! Storage module for the intent router.
//!
//! Provides a byte-oriented key/value backend trait plus a typed service on
//! top of it. The router keeps two kinds of records here: replay marks for
//! consumed authorizations, which must be permanent, and outcome records of
//! committed executions.

use async_trait::async_trait;
use router_types::{ConfigSchema, ImplementationRegistry, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	/// A create-only insert found the key already present.
	#[error("Already exists: {0}")]
	AlreadyExists(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Low-level interface for storage backends.
///
/// Keys have the form `<namespace>:<id>`. Backends that support expiry
/// must never expire keys of a permanent namespace.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, overwriting any previous value.
	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError>;

	/// Stores raw bytes only if the key is absent.
	///
	/// The check and the write are a single atomic step; a present key fails
	/// with [`StorageError::AlreadyExists`].
	async fn insert_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Removes expired entries and returns how many were removed.
	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		Ok(0)
	}
}

/// Factory function building a storage backend from its TOML table.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Returns `(name, factory)` for every storage implementation.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed storage service with JSON serialization.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

fn storage_key(namespace: &str, id: &str) -> String {
	format!("{}:{}", namespace, id)
}

/// Namespace part of a `<namespace>:<id>` key, if it is a known one.
pub(crate) fn namespace_of(key: &str) -> Option<StorageKey> {
	key.split(':').next().and_then(|ns| ns.parse().ok())
}

/// Rejects a non-zero TTL on a key of a permanent namespace.
pub(crate) fn ensure_expirable(key: &str, ttl: Option<Duration>) -> Result<(), StorageError> {
	match (namespace_of(key), ttl) {
		(Some(ns), Some(ttl)) if ns.is_permanent() && !ttl.is_zero() => {
			Err(StorageError::Configuration(format!(
				"namespace '{}' is permanent and cannot expire",
				ns.as_str()
			)))
		},
		_ => Ok(()),
	}
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a value under `namespace:id`, overwriting any previous value.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		self.store_with_ttl(namespace, id, data, None).await
	}

	/// Stores a value with an explicit time-to-live.
	pub async fn store_with_ttl<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&storage_key(namespace, id), bytes, ttl)
			.await
	}

	/// Stores a value only if `namespace:id` is not present yet.
	pub async fn insert<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.insert_bytes(&storage_key(namespace, id), bytes)
			.await
	}

	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&storage_key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&storage_key(namespace, id)).await
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&storage_key(namespace, id)).await
	}

	/// Removes expired entries; a no-op for backends without expiry.
	pub async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		self.backend.cleanup_expired().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Record {
		digest: String,
		amount: u64,
	}

	#[tokio::test]
	async fn test_typed_round_trip() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let record = Record {
			digest: "0xabc".into(),
			amount: 5,
		};

		service.store("outcomes", "1", &record).await.unwrap();
		let loaded: Record = service.retrieve("outcomes", "1").await.unwrap();
		assert_eq!(loaded, record);
		assert!(service.exists("outcomes", "1").await.unwrap());
		assert!(!service.exists("used_authorizations", "1").await.unwrap());

		service.remove("outcomes", "1").await.unwrap();
		let missing = service.retrieve::<Record>("outcomes", "1").await;
		assert!(matches!(missing, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_insert_is_create_only() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));

		service.insert("used_authorizations", "k", &true).await.unwrap();
		let second = service.insert("used_authorizations", "k", &true).await;
		assert!(matches!(second, Err(StorageError::AlreadyExists(key)) if key == "used_authorizations:k"));
	}

	#[test]
	fn test_permanent_namespace_cannot_expire() {
		let ttl = Some(Duration::from_secs(60));
		assert!(ensure_expirable("used_authorizations:k", ttl).is_err());
		assert!(ensure_expirable("used_authorizations:k", None).is_ok());
		assert!(ensure_expirable("outcomes:k", ttl).is_ok());
		assert!(ensure_expirable("unknown:k", ttl).is_ok());
	}

	#[test]
	fn test_registered_implementations() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert_eq!(names, vec!["file", "memory"]);
	}
}
