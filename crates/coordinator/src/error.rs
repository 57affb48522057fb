//! Error types for the search coordinator and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`SearchCoordinator`](crate::SearchCoordinator) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorError {
	/// The coordinator was torn down and no longer accepts commands.
	#[error("search coordinator has shut down")]
	Closed,
}

/// Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;

/// Cause carried by [`Resource::Error`](crate::Resource::Error).
///
/// Supplier failures are values, not panics: they end the subscription that
/// produced them and leave the coordinator alive for the next request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
	/// The remote call failed.
	#[error("network error: {0}")]
	Network(String),

	/// The local cache could not be read or written.
	#[error("storage error: {0}")]
	Storage(String),

	/// Any other supplier failure.
	#[error("{0}")]
	Other(String),
}

/// Errors raised by a [`FreshnessStore`](crate::FreshnessStore).
#[derive(Debug, Error)]
pub enum FreshnessError {
	/// The backing file could not be read or written.
	#[error("I/O error on {path}: {error}")]
	Io {
		/// Path of the freshness file.
		path: PathBuf,
		/// The underlying I/O error.
		#[source]
		error: std::io::Error,
	},

	/// The backing file is not valid JSON.
	#[error("malformed freshness record: {0}")]
	Json(#[from] serde_json::Error),
}

/// Errors that can occur when loading a [`CoordinatorConfig`](crate::CoordinatorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		#[source]
		error: std::io::Error,
	},

	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// A field holds a value the coordinator cannot run with.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}
