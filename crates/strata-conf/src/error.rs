//! Configuration errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfError {
	#[error("Failed to read settings file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("Failed to parse environment variable '{key}' (value length: {value_len}): {reason}")]
	Env {
		key: String,
		/// Length of the raw value; the value itself may be a secret
		value_len: usize,
		reason: String,
	},

	#[error("Failed to load .env file: {0}")]
	Dotenv(String),

	#[error("No database URL configured (set `database_url` or STRATA_DATABASE_URL)")]
	MissingDatabaseUrl,

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

pub type ConfResult<T> = std::result::Result<T, ConfError>;
