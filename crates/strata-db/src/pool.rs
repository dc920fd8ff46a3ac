//! Workload-specialized connection pools
//!
//! Each [`SpecializedConnectionPool`] owns one driver pool tuned for a single
//! workload ([`PoolType`]), guarded by its own circuit breaker and observed
//! by a health monitor and a metrics collector.

pub mod circuit_breaker;
pub mod config;
pub mod dsn;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod specialized;
pub mod system;
pub mod workload;

pub use circuit_breaker::{CircuitBreaker, CircuitState, Transition};
pub use config::{PoolConfiguration, ProfileTable, SessionSettings};
pub use dsn::redact_dsn;
pub use errors::{PoolError, PoolResult};
pub use health::HealthStatus;
pub use metrics::{LatencyWindow, PoolMetrics, PoolMetricsSnapshot, ThroughputWindow};
pub use specialized::{PooledLease, SpecializedConnectionPool};
pub use system::{ProcessSampler, SystemSample};
pub use workload::{PoolType, QueryType};

/// Re-export commonly used types
pub mod prelude {
	pub use super::config::*;
	pub use super::errors::*;
	pub use super::health::*;
	pub use super::specialized::*;
	pub use super::workload::*;
}
