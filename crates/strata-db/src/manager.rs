//! Pool manager
//!
//! [`EnterpriseConnectionPoolManager`] owns one
//! [`SpecializedConnectionPool`](crate::pool::SpecializedConnectionPool) per
//! workload, routes queries to them with failover, and aggregates their
//! metrics.

mod monitor;
pub mod pool_manager;
pub mod routing;
pub mod snapshot;

pub use pool_manager::{EnterpriseConnectionPoolManager, ManagerConfig, QueryOptions};
pub use routing::{FailoverGraph, RoutingTable, preferred_pool, select_pool};
pub use snapshot::{
	HealthAlert, ManagerSummary, MetricsSnapshot, OverallHealth, PerformanceTargets,
	ScalingReason, ScalingSuggestion, TargetCheck, TargetCompliance,
};
