//! Manager-level metrics aggregation
//!
//! Everything here is a pure function of per-pool snapshots, so the
//! comprehensive metrics call and the manager's monitors never touch pool
//! state.

use crate::pool::{HealthStatus, PoolMetricsSnapshot, PoolType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Utilization above which the health aggregation flags a pool
pub const CRITICAL_UTILIZATION_PERCENT: f64 = 90.0;
/// Utilization above which the trend analysis suggests scaling
pub const HIGH_UTILIZATION_PERCENT: f64 = 80.0;
/// Share of slow queries above which the trend analysis flags a pool
pub const HIGH_SLOW_QUERY_PERCENT: f64 = 10.0;

/// Service-level targets the pools are evaluated against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceTargets {
	pub min_total_capacity: u32,
	pub auth_avg_latency_ms: f64,
	pub read_avg_latency_ms: f64,
	pub min_success_rate_percent: f64,
	pub max_utilization_percent: f64,
}

impl Default for PerformanceTargets {
	fn default() -> Self {
		Self {
			min_total_capacity: 200,
			auth_avg_latency_ms: 50.0,
			read_avg_latency_ms: 200.0,
			min_success_rate_percent: 99.9,
			max_utilization_percent: 80.0,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
	Healthy,
	Degraded,
	Critical,
}

impl OverallHealth {
	/// `Healthy` if every pool is healthy, `Degraded` if at least half
	/// are, `Critical` otherwise (including when there are no pools)
	pub fn from_counts(healthy: usize, total: usize) -> Self {
		if total > 0 && healthy == total {
			OverallHealth::Healthy
		} else if total > 0 && healthy * 2 >= total {
			OverallHealth::Degraded
		} else {
			OverallHealth::Critical
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerSummary {
	pub pool_count: usize,
	pub healthy_pools: usize,
	pub total_connections: u32,
	pub active_connections: u32,
	pub idle_connections: u32,
	pub max_capacity: u32,
	pub total_queries: u64,
	pub successful_queries: u64,
	pub failed_queries: u64,
	pub success_rate: f64,
	pub utilization_percent: f64,
	pub overall_health: OverallHealth,
}

impl ManagerSummary {
	pub fn from_pools(pools: &BTreeMap<PoolType, PoolMetricsSnapshot>) -> Self {
		let mut summary = ManagerSummary {
			pool_count: pools.len(),
			healthy_pools: 0,
			total_connections: 0,
			active_connections: 0,
			idle_connections: 0,
			max_capacity: 0,
			total_queries: 0,
			successful_queries: 0,
			failed_queries: 0,
			success_rate: 100.0,
			utilization_percent: 0.0,
			overall_health: OverallHealth::Critical,
		};

		for snapshot in pools.values() {
			if snapshot.health.status == HealthStatus::Healthy {
				summary.healthy_pools += 1;
			}
			summary.total_connections += snapshot.connections.total;
			summary.active_connections += snapshot.connections.active;
			summary.idle_connections += snapshot.connections.idle;
			summary.max_capacity += snapshot.connections.max;
			summary.total_queries += snapshot.performance.total_queries;
			summary.successful_queries += snapshot.performance.successful_queries;
			summary.failed_queries += snapshot.performance.failed_queries;
		}

		if summary.total_queries > 0 {
			summary.success_rate =
				summary.successful_queries as f64 / summary.total_queries as f64 * 100.0;
		}
		if summary.max_capacity > 0 {
			summary.utilization_percent =
				summary.active_connections as f64 / summary.max_capacity as f64 * 100.0;
		}
		summary.overall_health = OverallHealth::from_counts(summary.healthy_pools, summary.pool_count);
		summary
	}
}

/// One target, its measured value and whether it is met
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TargetCheck {
	pub target: f64,
	pub actual: f64,
	pub met: bool,
}

impl TargetCheck {
	fn at_least(target: f64, actual: f64) -> Self {
		Self {
			target,
			actual,
			met: actual >= target,
		}
	}

	fn at_most(target: f64, actual: f64) -> Self {
		Self {
			target,
			actual,
			met: actual <= target,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetCompliance {
	pub total_capacity: TargetCheck,
	pub auth_latency: TargetCheck,
	pub read_latency: TargetCheck,
	pub success_rate: TargetCheck,
	pub utilization: TargetCheck,
	pub all_met: bool,
}

impl TargetCompliance {
	pub fn evaluate(
		pools: &BTreeMap<PoolType, PoolMetricsSnapshot>,
		summary: &ManagerSummary,
		targets: &PerformanceTargets,
	) -> Self {
		let avg_latency = |pool: PoolType| {
			pools
				.get(&pool)
				.map(|snapshot| snapshot.performance.avg_latency_ms)
				.unwrap_or(0.0)
		};

		let total_capacity = TargetCheck::at_least(
			targets.min_total_capacity as f64,
			summary.max_capacity as f64,
		);
		let auth_latency = TargetCheck::at_most(targets.auth_avg_latency_ms, avg_latency(PoolType::Auth));
		let read_latency = TargetCheck::at_most(targets.read_avg_latency_ms, avg_latency(PoolType::Read));
		let success_rate = TargetCheck::at_least(targets.min_success_rate_percent, summary.success_rate);
		let utilization = TargetCheck::at_most(targets.max_utilization_percent, summary.utilization_percent);

		let all_met = [total_capacity, auth_latency, read_latency, success_rate, utilization]
			.iter()
			.all(|check| check.met);

		Self {
			total_capacity,
			auth_latency,
			read_latency,
			success_rate,
			utilization,
			all_met,
		}
	}
}

/// Result of [`EnterpriseConnectionPoolManager::get_comprehensive_metrics`](super::EnterpriseConnectionPoolManager::get_comprehensive_metrics)
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
	pub captured_at: DateTime<Utc>,
	pub initialized: bool,
	pub pools: BTreeMap<PoolType, PoolMetricsSnapshot>,
	pub summary: ManagerSummary,
	pub targets: TargetCompliance,
}

impl MetricsSnapshot {
	pub fn build(
		pools: BTreeMap<PoolType, PoolMetricsSnapshot>,
		targets: &PerformanceTargets,
		initialized: bool,
	) -> Self {
		let summary = ManagerSummary::from_pools(&pools);
		let targets = TargetCompliance::evaluate(&pools, &summary, targets);
		Self {
			captured_at: Utc::now(),
			initialized,
			pools,
			summary,
			targets,
		}
	}
}

/// A pool condition the health aggregation reports
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HealthAlert {
	Unhealthy { pool: PoolType, status: HealthStatus },
	CriticalUtilization { pool: PoolType, utilization_percent: f64 },
}

pub fn health_alerts(pools: &BTreeMap<PoolType, PoolMetricsSnapshot>) -> Vec<HealthAlert> {
	let mut alerts = Vec::new();
	for (pool, snapshot) in pools {
		if snapshot.health.status != HealthStatus::Healthy {
			alerts.push(HealthAlert::Unhealthy {
				pool: *pool,
				status: snapshot.health.status,
			});
		}
		if snapshot.connections.utilization_percent > CRITICAL_UTILIZATION_PERCENT {
			alerts.push(HealthAlert::CriticalUtilization {
				pool: *pool,
				utilization_percent: snapshot.connections.utilization_percent,
			});
		}
	}
	alerts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingReason {
	HighUtilization,
	HighSlowQueryRate,
}

/// Informational scaling advice; nothing is resized automatically
#[derive(Debug, Clone, Serialize)]
pub struct ScalingSuggestion {
	pub pool: PoolType,
	pub reason: ScalingReason,
	pub utilization_percent: f64,
	pub slow_query_percent: f64,
	pub current_max_connections: u32,
	pub suggested_max_connections: Option<u32>,
	pub recommendation: String,
}

fn slow_query_percent(snapshot: &PoolMetricsSnapshot) -> f64 {
	let performance = &snapshot.performance;
	if performance.total_queries == 0 {
		return 0.0;
	}
	performance.slow_queries as f64 / performance.total_queries as f64 * 100.0
}

pub fn scaling_suggestions(
	pools: &BTreeMap<PoolType, PoolMetricsSnapshot>,
) -> Vec<ScalingSuggestion> {
	let mut suggestions = Vec::new();
	for (pool, snapshot) in pools {
		let utilization = snapshot.connections.utilization_percent;
		let slow = slow_query_percent(snapshot);
		let max = snapshot.connections.max;

		if utilization > HIGH_UTILIZATION_PERCENT {
			let suggested = max.saturating_add(max.div_ceil(4).max(1));
			suggestions.push(ScalingSuggestion {
				pool: *pool,
				reason: ScalingReason::HighUtilization,
				utilization_percent: utilization,
				slow_query_percent: slow,
				current_max_connections: max,
				suggested_max_connections: Some(suggested),
				recommendation: format!(
					"Raise max_connections for the {} pool from {} to {}",
					pool, max, suggested
				),
			});
		}
		if slow > HIGH_SLOW_QUERY_PERCENT {
			suggestions.push(ScalingSuggestion {
				pool: *pool,
				reason: ScalingReason::HighSlowQueryRate,
				utilization_percent: utilization,
				slow_query_percent: slow,
				current_max_connections: max,
				suggested_max_connections: None,
				recommendation: format!(
					"{:.1}% of {} pool queries are slow; review query plans and indexes",
					slow, pool
				),
			});
		}
	}
	suggestions
}
