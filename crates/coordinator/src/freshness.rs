//! [`FreshnessStore`] implementations.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FreshnessError;
use crate::ports::FreshnessStore;

#[derive(Debug, Default)]
struct MemoryState {
	last_query: Option<String>,
	writes: usize,
}

/// In-process freshness store. Clones share the same record.
#[derive(Debug, Default, Clone)]
pub struct MemoryFreshnessStore {
	inner: Arc<Mutex<MemoryState>>,
}

impl MemoryFreshnessStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store that already remembers `query`.
	pub fn with_last_query(query: impl Into<String>) -> Self {
		let store = Self::new();
		store.lock().last_query = Some(query.into());
		store
	}

	/// Currently recorded query.
	pub fn get(&self) -> Option<String> {
		self.lock().last_query.clone()
	}

	/// Number of `set_last_query` calls received.
	pub fn writes(&self) -> usize {
		self.lock().writes
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
		self.inner.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[async_trait]
impl FreshnessStore for MemoryFreshnessStore {
	async fn last_query(&self) -> Result<Option<String>, FreshnessError> {
		Ok(self.get())
	}

	async fn set_last_query(&self, query: &str) -> Result<(), FreshnessError> {
		let mut state = self.lock();
		state.last_query = Some(query.to_owned());
		state.writes += 1;
		Ok(())
	}
}

#[derive(Debug, Serialize, Deserialize)]
struct FreshnessRecord {
	last_query: String,
}

/// Freshness store persisted as a small JSON file.
///
/// A missing file means no query was fetched yet. Writes go to a sibling
/// temporary file that is renamed over the record.
#[derive(Debug, Clone)]
pub struct FileFreshnessStore {
	path: PathBuf,
}

impl FileFreshnessStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn io_error(&self, error: std::io::Error) -> FreshnessError {
		FreshnessError::Io {
			path: self.path.clone(),
			error,
		}
	}
}

#[async_trait]
impl FreshnessStore for FileFreshnessStore {
	async fn last_query(&self) -> Result<Option<String>, FreshnessError> {
		let bytes = match tokio::fs::read(&self.path).await {
			Ok(bytes) => bytes,
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(error) => return Err(self.io_error(error)),
		};
		let record: FreshnessRecord = serde_json::from_slice(&bytes)?;
		Ok(Some(record.last_query))
	}

	async fn set_last_query(&self, query: &str) -> Result<(), FreshnessError> {
		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			tokio::fs::create_dir_all(parent).await.map_err(|error| self.io_error(error))?;
		}

		let json = serde_json::to_vec(&FreshnessRecord {
			last_query: query.to_owned(),
		})?;
		let staging = self.path.with_extension("tmp");
		tokio::fs::write(&staging, json).await.map_err(|error| self.io_error(error))?;
		tokio::fs::rename(&staging, &self.path).await.map_err(|error| self.io_error(error))?;
		Ok(())
	}
}
