//! Coordinator configuration.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! mode = "advanced"
//! command_capacity = 64
//! event_buffer = 64
//! shutdown_timeout_ms = 1000
//!
//! [connectivity]
//! resubscribe_attempts = 3
//! resubscribe_backoff_ms = 250
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::decision::SearchMode;
use crate::error::ConfigError;

/// Runtime settings for one [`SearchCoordinator`](crate::SearchCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
	/// Simple (always refetch) or advanced (reuse + connectivity gate).
	pub mode: SearchMode,
	/// Capacity of the bounded command queue.
	pub command_capacity: usize,
	/// Capacity of the resource transition broadcast.
	pub event_buffer: usize,
	/// How long teardown waits for each task before aborting it.
	pub shutdown_timeout_ms: u64,
	/// Connectivity merge behaviour.
	pub connectivity: ConnectivityConfig,
}

/// Recovery policy for a connectivity stream that ends.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectivityConfig {
	/// Consecutive resubscriptions allowed while no stream delivers a status.
	pub resubscribe_attempts: usize,
	/// Delay before each resubscription.
	pub resubscribe_backoff_ms: u64,
}

impl Default for CoordinatorConfig {
	fn default() -> Self {
		Self {
			mode: SearchMode::default(),
			command_capacity: 64,
			event_buffer: 64,
			shutdown_timeout_ms: 1000,
			connectivity: ConnectivityConfig::default(),
		}
	}
}

impl Default for ConnectivityConfig {
	fn default() -> Self {
		Self {
			resubscribe_attempts: 3,
			resubscribe_backoff_ms: 250,
		}
	}
}

impl CoordinatorConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.command_capacity == 0 {
			return Err(ConfigError::Invalid("command_capacity must be > 0".into()));
		}
		if self.event_buffer == 0 {
			return Err(ConfigError::Invalid("event_buffer must be > 0".into()));
		}
		Ok(())
	}

	#[must_use]
	pub fn with_mode(mut self, mode: SearchMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn shutdown_timeout(&self) -> Duration {
		Duration::from_millis(self.shutdown_timeout_ms)
	}
}

impl ConnectivityConfig {
	pub fn resubscribe_backoff(&self) -> Duration {
		Duration::from_millis(self.resubscribe_backoff_ms)
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	#[test]
	fn empty_document_yields_defaults() {
		assert_eq!(CoordinatorConfig::from_toml_str("").ok(), Some(CoordinatorConfig::default()));
	}

	#[test]
	fn parses_every_field() {
		let config = CoordinatorConfig::from_toml_str(
			r#"
			mode = "simple"
			command_capacity = 8
			event_buffer = 16
			shutdown_timeout_ms = 50

			[connectivity]
			resubscribe_attempts = 0
			resubscribe_backoff_ms = 10
			"#,
		)
		.expect("valid config");

		assert_eq!(config.mode, SearchMode::Simple);
		assert_eq!(config.command_capacity, 8);
		assert_eq!(config.event_buffer, 16);
		assert_eq!(config.shutdown_timeout(), Duration::from_millis(50));
		assert_eq!(config.connectivity.resubscribe_attempts, 0);
		assert_eq!(config.connectivity.resubscribe_backoff(), Duration::from_millis(10));
	}

	#[test]
	fn rejects_zero_capacity() {
		let err = CoordinatorConfig::from_toml_str("command_capacity = 0").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
	}

	#[test]
	fn rejects_unknown_fields_and_modes() {
		assert!(matches!(CoordinatorConfig::from_toml_str("colour = 1"), Err(ConfigError::Toml(_))));
		assert!(matches!(CoordinatorConfig::from_toml_str("mode = \"eager\""), Err(ConfigError::Toml(_))));
	}

	#[test]
	fn load_reads_file_and_reports_missing_path() {
		let mut file = tempfile::NamedTempFile::new().expect("temp file");
		writeln!(file, "mode = \"simple\"").expect("write config");
		let config = CoordinatorConfig::load(file.path()).expect("load config");
		assert_eq!(config.mode, SearchMode::Simple);

		let missing = file.path().with_extension("missing");
		assert!(matches!(CoordinatorConfig::load(&missing), Err(ConfigError::Io { .. })));
	}
}
