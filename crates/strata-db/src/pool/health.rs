//! Pool health classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEGRADED_LATENCY: Duration = Duration::from_secs(1);
const CRITICAL_LATENCY: Duration = Duration::from_secs(5);

/// Health of a single pool as seen by its monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
	#[default]
	Healthy,
	/// Health checks succeed but are slow
	Degraded,
	/// Health checks are very slow, or the circuit breaker is open
	Critical,
	/// The circuit breaker is half-open
	Recovering,
	/// Health checks failed `failover_threshold` times in a row
	Unavailable,
}

impl HealthStatus {
	/// Classify a successful health-check round trip
	///
	/// # Examples
	///
	/// ```
	/// use strata_db::pool::HealthStatus;
	/// use std::time::Duration;
	///
	/// assert_eq!(HealthStatus::from_latency(Duration::from_millis(20)), HealthStatus::Healthy);
	/// assert_eq!(HealthStatus::from_latency(Duration::from_secs(2)), HealthStatus::Degraded);
	/// assert_eq!(HealthStatus::from_latency(Duration::from_secs(5)), HealthStatus::Critical);
	/// ```
	pub fn from_latency(latency: Duration) -> Self {
		if latency < DEGRADED_LATENCY {
			HealthStatus::Healthy
		} else if latency < CRITICAL_LATENCY {
			HealthStatus::Degraded
		} else {
			HealthStatus::Critical
		}
	}

	/// Whether the manager may send traffic to a pool in this state
	/// when looking for a failover target
	pub fn is_routable(&self) -> bool {
		matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			HealthStatus::Healthy => "healthy",
			HealthStatus::Degraded => "degraded",
			HealthStatus::Critical => "critical",
			HealthStatus::Recovering => "recovering",
			HealthStatus::Unavailable => "unavailable",
		}
	}
}

impl fmt::Display for HealthStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
