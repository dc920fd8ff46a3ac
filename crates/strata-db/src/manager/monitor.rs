//! Manager-level monitoring loops
//!
//! Both loops only read pool snapshots and log what they find.

use super::snapshot::{HealthAlert, health_alerts, scaling_suggestions};
use crate::backends::Connector;
use crate::pool::{PoolMetricsSnapshot, PoolType, SpecializedConnectionPool};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub(crate) type PoolSet<C> = Vec<Arc<SpecializedConnectionPool<C>>>;

pub(crate) fn collect_snapshots<C: Connector>(
	pools: &[Arc<SpecializedConnectionPool<C>>],
) -> BTreeMap<PoolType, PoolMetricsSnapshot> {
	pools
		.iter()
		.map(|pool| (pool.pool_type(), pool.metrics_snapshot()))
		.collect()
}

/// Log unhealthy pools and pools close to exhaustion
pub(crate) fn report_health<C: Connector>(pools: &[Arc<SpecializedConnectionPool<C>>]) {
	let snapshots = collect_snapshots(pools);
	let alerts = health_alerts(&snapshots);
	for alert in &alerts {
		match alert {
			HealthAlert::Unhealthy { pool, status } => {
				tracing::warn!(pool = %pool, status = %status, "Pool unhealthy")
			}
			HealthAlert::CriticalUtilization {
				pool,
				utilization_percent,
			} => tracing::warn!(
				pool = %pool,
				utilization_percent = *utilization_percent,
				"Pool utilization above 90%"
			),
		}
	}
	if alerts.is_empty() {
		tracing::debug!(pools = snapshots.len(), "All pools healthy");
	}
}

/// Log scaling suggestions derived from utilization and slow-query rates
pub(crate) fn report_trends<C: Connector>(pools: &[Arc<SpecializedConnectionPool<C>>]) {
	let snapshots = collect_snapshots(pools);
	for suggestion in scaling_suggestions(&snapshots) {
		tracing::info!(
			pool = %suggestion.pool,
			reason = ?suggestion.reason,
			utilization_percent = suggestion.utilization_percent,
			slow_query_percent = suggestion.slow_query_percent,
			"{}",
			suggestion.recommendation
		);
	}
}

/// Run `tick` every `period` until a shutdown signal arrives
pub(crate) fn spawn_periodic<C, F>(
	pools: PoolSet<C>,
	period: Duration,
	mut shutdown_rx: broadcast::Receiver<()>,
	tick: F,
) -> JoinHandle<()>
where
	C: Connector,
	F: Fn(&[Arc<SpecializedConnectionPool<C>>]) + Send + 'static,
{
	tokio::spawn(async move {
		let mut ticker = tokio::time::interval(period);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
		// The first tick completes immediately
		ticker.tick().await;

		loop {
			tokio::select! {
				_ = ticker.tick() => tick(&pools),
				_ = shutdown_rx.recv() => break,
			}
		}
	})
}
