//! File-based storage backend.
//!
//! Every key is one file under the base directory. Files start with a fixed
//! 64-byte header carrying the expiry time, followed by the value. Writes go
//! through a temporary file and a rename; create-only inserts go through a
//! hard link, which fails atomically when the target already exists. The base
//! directory is locked for the lifetime of the backend so that two processes
//! cannot share one set of replay marks.

use crate::{ensure_expirable, StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use fs2::FileExt;
use router_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, StorageKey, ValidationError,
};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

const LOCK_FILE: &str = ".lock";

fn now_secs() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Fixed-size record header.
///
/// Layout (64 bytes):
/// - `[0..4]`: magic `IRTR`
/// - `[4..6]`: version, u16 little-endian
/// - `[6..14]`: expiry, u64 little-endian Unix seconds, 0 = never
/// - `[14..64]`: reserved, zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordHeader {
	expires_at: u64,
}

impl RecordHeader {
	const MAGIC: &'static [u8; 4] = b"IRTR";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn new(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			now_secs().saturating_add(ttl.as_secs().max(1))
		};
		Self { expires_at }
	}

	fn encode(&self, value: &[u8]) -> Vec<u8> {
		let mut out = vec![0u8; Self::SIZE];
		out[0..4].copy_from_slice(Self::MAGIC);
		out[4..6].copy_from_slice(&Self::VERSION.to_le_bytes());
		out[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		out.extend_from_slice(value);
		out
	}

	fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE || &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Corrupt record header".into()));
		}
		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported record version: {}",
				version
			)));
		}
		let mut expires = [0u8; 8];
		expires.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			expires_at: u64::from_le_bytes(expires),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && now_secs() >= self.expires_at
	}
}

/// Per-namespace default TTLs, read from `ttl_<namespace>` keys.
///
/// Permanent namespaces never get an entry.
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	fn from_config(config: &toml::Value) -> Self {
		let ttls = StorageKey::all()
			.filter(|key| !key.is_permanent())
			.filter_map(|key| {
				config
					.get(format!("ttl_{}", key.as_str()))
					.and_then(|v| v.as_integer())
					.and_then(|v| u64::try_from(v).ok())
					.map(|secs| (key, Duration::from_secs(secs)))
			})
			.collect();
		Self { ttls }
	}

	fn ttl_for(&self, key: &str) -> Duration {
		crate::namespace_of(key)
			.and_then(|ns| self.ttls.get(&ns).copied())
			.unwrap_or(Duration::ZERO)
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
	/// Exclusive lock on the base directory, released on drop.
	_lock: File,
	temp_counter: AtomicU64,
}

impl FileStorage {
	/// Opens (creating if needed) a storage directory and locks it.
	pub fn open(base_path: impl AsRef<Path>, ttl_config: TtlConfig) -> Result<Self, StorageError> {
		let base_path = base_path.as_ref().to_path_buf();
		std::fs::create_dir_all(&base_path).map_err(|e| StorageError::Backend(e.to_string()))?;

		let lock = File::create(base_path.join(LOCK_FILE))
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		lock.try_lock_exclusive().map_err(|e| {
			StorageError::Backend(format!(
				"Storage directory {} is locked by another process: {}",
				base_path.display(),
				e
			))
		})?;

		Ok(Self {
			base_path,
			ttl_config,
			_lock: lock,
			temp_counter: AtomicU64::new(0),
		})
	}

	fn file_path(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', ':', '\\'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}

	fn temp_path(&self, path: &Path) -> PathBuf {
		let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
		path.with_extension(format!("{}.tmp", n))
	}

	/// Reads a record, returning `None` when it is missing.
	async fn read_record(&self, path: &Path) -> Result<Option<(RecordHeader, Vec<u8>)>, StorageError> {
		let data = match fs::read(path).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};
		let header = RecordHeader::decode(&data)?;
		Ok(Some((header, data[RecordHeader::SIZE..].to_vec())))
	}

	async fn link_new(&self, temp: &Path, path: &Path) -> Result<bool, StorageError> {
		match fs::hard_link(temp, path).await {
			Ok(()) => Ok(true),
			Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		match self.read_record(&self.file_path(key)).await? {
			Some((header, value)) if !header.is_expired() => Ok(value),
			_ => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		ensure_expirable(key, ttl)?;
		let path = self.file_path(key);
		let ttl = ttl.unwrap_or_else(|| self.ttl_config.ttl_for(key));
		let record = RecordHeader::new(ttl).encode(&value);

		let temp = self.temp_path(&path);
		fs::write(&temp, record)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn insert_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.file_path(key);
		let record = RecordHeader::new(self.ttl_config.ttl_for(key)).encode(&value);

		let temp = self.temp_path(&path);
		fs::write(&temp, record)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let mut linked = self.link_new(&temp, &path).await;
		if let Ok(false) = linked {
			// An expired record does not count as present.
			if let Some((header, _)) = self.read_record(&path).await? {
				if header.is_expired() {
					let _ = fs::remove_file(&path).await;
					linked = self.link_new(&temp, &path).await;
				}
			}
		}
		let _ = fs::remove_file(&temp).await;

		match linked? {
			true => Ok(()),
			false => Err(StorageError::AlreadyExists(key.to_string())),
		}
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.file_path(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self
			.read_record(&self.file_path(key))
			.await?
			.is_some_and(|(header, _)| !header.is_expired()))
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut removed = 0;
		let mut entries = fs::read_dir(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}
			match self.read_record(&path).await {
				Ok(Some((header, _))) if header.is_expired() => match fs::remove_file(&path).await {
					Ok(()) => removed += 1,
					Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove expired record"),
				},
				Ok(_) => {},
				Err(e) => {
					tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable record")
				},
			}
		}
		Ok(removed)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let mut optional = vec![Field::new("storage_path", FieldType::String)];
		for key in StorageKey::all() {
			let field_name = format!("ttl_{}", key.as_str());
			if key.is_permanent() {
				if config.get(&field_name).is_some() {
					return Err(ValidationError::InvalidValue {
						field: field_name,
						message: format!("namespace '{}' is permanent", key.as_str()),
					});
				}
				continue;
			}
			optional.push(Field::new(
				field_name,
				FieldType::Integer {
					min: Some(0),
					max: None,
				},
			));
		}

		Schema::new(vec![], optional).validate(config)
	}
}

/// Factory function to create a file storage backend.
///
/// Configuration parameters:
/// - `storage_path`: base directory (default: "./data/storage")
/// - `ttl_outcomes`: TTL in seconds for outcome records (default: 0, never)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage");

	Ok(Box::new(FileStorage::open(
		storage_path,
		TtlConfig::from_config(config),
	)?))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}
