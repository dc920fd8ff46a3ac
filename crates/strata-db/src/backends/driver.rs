//! Driver seam
//!
//! The pools in this crate never talk to a database directly. They consume a
//! pool primitive through three narrow traits:
//!
//! - [`Connector`] builds a driver pool from a DSN and [`DriverPoolOptions`]
//! - [`PoolDriver`] leases connections and reports its size
//! - [`DriverConnection`] runs `execute(sql)` / `fetch(sql, args)`
//!
//! The production implementation lives in [`super::any`] and wraps
//! `sqlx::AnyPool`.

use super::types::{QueryValue, Row};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a driver implementation
#[derive(Debug, Error)]
pub enum DriverError {
	/// The driver could not open or reach a connection
	#[error("Connection error: {0}")]
	Connection(String),

	/// The driver's own acquire deadline elapsed
	#[error("Timed out waiting for a free connection")]
	PoolTimedOut,

	/// The driver pool has been closed
	#[error("Driver pool is closed")]
	PoolClosed,

	/// The statement failed on the server or could not be decoded
	#[error("Query error: {0}")]
	Query(String),

	#[error("Configuration error: {0}")]
	Configuration(String),
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

impl From<sqlx::Error> for DriverError {
	fn from(err: sqlx::Error) -> Self {
		match err {
			sqlx::Error::PoolTimedOut => DriverError::PoolTimedOut,
			sqlx::Error::PoolClosed => DriverError::PoolClosed,
			sqlx::Error::Io(e) => DriverError::Connection(e.to_string()),
			sqlx::Error::Tls(e) => DriverError::Connection(e.to_string()),
			sqlx::Error::Protocol(msg) => DriverError::Connection(msg),
			sqlx::Error::Configuration(e) => DriverError::Configuration(e.to_string()),
			other => DriverError::Query(other.to_string()),
		}
	}
}

/// Options passed to the driver's pool constructor
#[derive(Debug, Clone)]
pub struct DriverPoolOptions {
	pub min_connections: u32,
	pub max_connections: u32,
	pub acquire_timeout: Duration,
	pub idle_timeout: Option<Duration>,
	pub max_lifetime: Option<Duration>,
	/// Statements run once on every new physical connection
	pub session_statements: Vec<String>,
	/// Label for the pool's connections in driver logs
	pub application_name: String,
}

impl Default for DriverPoolOptions {
	fn default() -> Self {
		Self {
			min_connections: 1,
			max_connections: 10,
			acquire_timeout: Duration::from_secs(30),
			idle_timeout: Some(Duration::from_secs(600)),
			max_lifetime: Some(Duration::from_secs(1800)),
			session_statements: Vec::new(),
			application_name: "strata".to_string(),
		}
	}
}

/// Builds driver pools
#[async_trait]
pub trait Connector: Send + Sync + 'static {
	type Pool: PoolDriver;

	/// Create a pool and establish `min_connections` connections
	async fn connect(&self, dsn: &str, options: &DriverPoolOptions) -> DriverResult<Self::Pool>;
}

/// A driver-level connection pool
#[async_trait]
pub trait PoolDriver: Send + Sync + 'static {
	type Connection: DriverConnection;

	/// Lease a connection, honoring the driver's own acquire timeout
	async fn acquire(&self) -> DriverResult<Self::Connection>;

	/// Number of open connections, idle or in use
	fn size(&self) -> u32;

	fn num_idle(&self) -> usize;

	async fn close(&self);
}

/// A leased driver connection; returned to its pool when dropped
#[async_trait]
pub trait DriverConnection: Send + 'static {
	/// Run a statement without bound parameters, returning rows affected
	async fn execute(&mut self, sql: &str) -> DriverResult<u64>;

	/// Run a statement with positional parameters and collect the rows
	async fn fetch(&mut self, sql: &str, args: &[QueryValue]) -> DriverResult<Vec<Row>>;
}
