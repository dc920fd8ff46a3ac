//! Pool error types

use super::workload::PoolType;
use crate::backends::DriverError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by pools and the pool manager
#[derive(Debug, Error)]
pub enum PoolError {
	/// A pool could not be brought up
	#[error("Failed to initialize {pool} pool: {reason}")]
	Initialization { pool: PoolType, reason: String },

	/// Some pools came up, others did not; the failed ones stay registered
	/// as `Unavailable`
	#[error("{} of 6 pools failed to initialize: {}", failed.len(), format_pools(failed))]
	PartialInitialization { failed: Vec<PoolType> },

	/// The pool's circuit breaker is rejecting requests
	#[error("Circuit breaker open for {pool} pool, retry in {retry_after:?}")]
	CircuitOpen { pool: PoolType, retry_after: Duration },

	#[error("Timed out after {timeout:?} acquiring a connection from the {pool} pool")]
	AcquisitionTimeout { pool: PoolType, timeout: Duration },

	#[error("Connection failure in {pool} pool: {reason}")]
	ConnectionFailed { pool: PoolType, reason: String },

	#[error("Query on {pool} pool exceeded {timeout:?}")]
	QueryTimeout { pool: PoolType, timeout: Duration },

	#[error("Query on {pool} pool failed: {reason}")]
	QueryExecution { pool: PoolType, reason: String },

	#[error("The {pool} pool is closed")]
	PoolClosed { pool: PoolType },

	#[error("The {0} pool has not been initialized")]
	NotInitialized(PoolType),

	#[error("Invalid pool configuration: {0}")]
	Config(String),
}

fn format_pools(pools: &[PoolType]) -> String {
	pools
		.iter()
		.map(PoolType::as_str)
		.collect::<Vec<_>>()
		.join(", ")
}

impl PoolError {
	/// Whether retrying the same request later may succeed
	pub fn is_transient(&self) -> bool {
		matches!(
			self,
			PoolError::CircuitOpen { .. }
				| PoolError::AcquisitionTimeout { .. }
				| PoolError::ConnectionFailed { .. }
		)
	}

	/// The pool the error originated from, when there is a single one
	pub fn pool(&self) -> Option<PoolType> {
		match self {
			PoolError::Initialization { pool, .. }
			| PoolError::CircuitOpen { pool, .. }
			| PoolError::AcquisitionTimeout { pool, .. }
			| PoolError::ConnectionFailed { pool, .. }
			| PoolError::QueryTimeout { pool, .. }
			| PoolError::QueryExecution { pool, .. }
			| PoolError::PoolClosed { pool } => Some(*pool),
			PoolError::NotInitialized(pool) => Some(*pool),
			PoolError::PartialInitialization { .. } | PoolError::Config(_) => None,
		}
	}

	/// Classify a driver error raised while leasing a connection
	pub(crate) fn from_acquire(pool: PoolType, timeout: Duration, err: DriverError) -> Self {
		match err {
			DriverError::PoolTimedOut => PoolError::AcquisitionTimeout { pool, timeout },
			DriverError::PoolClosed => PoolError::PoolClosed { pool },
			other => PoolError::ConnectionFailed {
				pool,
				reason: other.to_string(),
			},
		}
	}

	/// Classify a driver error raised while running a statement
	pub(crate) fn from_query(pool: PoolType, err: DriverError) -> Self {
		match err {
			DriverError::Connection(reason) => PoolError::ConnectionFailed { pool, reason },
			DriverError::PoolClosed => PoolError::PoolClosed { pool },
			other => PoolError::QueryExecution {
				pool,
				reason: other.to_string(),
			},
		}
	}
}

pub type PoolResult<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(PoolError::CircuitOpen { pool: PoolType::Auth, retry_after: Duration::from_secs(3) }, true)]
	#[case(PoolError::AcquisitionTimeout { pool: PoolType::Read, timeout: Duration::from_millis(100) }, true)]
	#[case(PoolError::ConnectionFailed { pool: PoolType::Write, reason: "reset".into() }, true)]
	#[case(PoolError::QueryTimeout { pool: PoolType::Batch, timeout: Duration::from_secs(1) }, false)]
	#[case(PoolError::QueryExecution { pool: PoolType::Admin, reason: "syntax".into() }, false)]
	#[case(PoolError::Config("bad".into()), false)]
	fn test_is_transient(#[case] err: PoolError, #[case] expected: bool) {
		assert_eq!(err.is_transient(), expected);
	}

	#[rstest]
	fn test_partial_initialization_lists_failed_pools() {
		let err = PoolError::PartialInitialization {
			failed: vec![PoolType::Analytics, PoolType::Batch],
		};

		assert_eq!(
			err.to_string(),
			"2 of 6 pools failed to initialize: analytics, batch"
		);
		assert_eq!(err.pool(), None);
	}

	#[rstest]
	fn test_driver_timeout_maps_to_acquisition_timeout() {
		// Act
		let err = PoolError::from_acquire(
			PoolType::Auth,
			Duration::from_millis(100),
			DriverError::PoolTimedOut,
		);

		// Assert
		assert!(matches!(
			err,
			PoolError::AcquisitionTimeout { pool: PoolType::Auth, timeout } if timeout == Duration::from_millis(100)
		));
	}
}
