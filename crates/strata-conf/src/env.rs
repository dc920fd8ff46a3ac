//! Prefixed environment variable lookup

use crate::error::{ConfError, ConfResult};
use std::env;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_PREFIX: &str = "STRATA_";

/// Reads `<prefix><KEY>` variables from the process environment
#[derive(Debug, Clone)]
pub struct EnvSource {
	prefix: String,
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new(DEFAULT_PREFIX)
	}
}

impl EnvSource {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	pub fn key(&self, key: &str) -> String {
		format!("{}{}", self.prefix, key.to_ascii_uppercase())
	}

	pub fn string(&self, key: &str) -> Option<String> {
		env::var(self.key(key)).ok().filter(|value| !value.is_empty())
	}

	/// Parse a variable, returning `None` when it is unset
	pub fn parse<T>(&self, key: &str) -> ConfResult<Option<T>>
	where
		T: FromStr,
		T::Err: std::fmt::Display,
	{
		let Some(raw) = self.string(key) else {
			return Ok(None);
		};
		raw.trim().parse().map(Some).map_err(|e: T::Err| ConfError::Env {
			key: self.key(key),
			value_len: raw.len(),
			reason: e.to_string(),
		})
	}
}

/// Load variables from a `.env` file without overriding ones already set
pub fn load_dotenv(path: Option<&Path>) -> ConfResult<()> {
	let result = match path {
		Some(path) => dotenv::from_path(path).map(|_| ()),
		None => dotenv::dotenv().map(|_| ()),
	};
	match result {
		Ok(()) => Ok(()),
		// A missing default .env is not an error
		Err(dotenv::Error::Io(e)) if path.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
			Ok(())
		}
		Err(e) => Err(ConfError::Dotenv(e.to_string())),
	}
}
