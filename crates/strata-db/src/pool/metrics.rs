//! Per-pool metrics
//!
//! [`PoolMetrics`] is the mutable record a pool keeps behind its mutex; it
//! also owns the pool's [`CircuitBreaker`] so breaker transitions and the
//! health status they imply are always updated together.
//! [`PoolMetricsSnapshot`] is the serializable view handed to callers.

use super::circuit_breaker::{CircuitBreaker, CircuitState, Transition};
use super::config::PoolConfiguration;
use super::health::HealthStatus;
use super::system::SystemSample;
use super::workload::{PoolType, QueryType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

/// Latency samples kept for the rolling statistics
pub const LATENCY_WINDOW: usize = 1000;
/// Throughput is averaged over this window
pub const QPS_WINDOW: Duration = Duration::from_secs(60);

/// Rolling window of the most recent query latencies, in milliseconds
#[derive(Debug, Clone)]
pub struct LatencyWindow {
	samples: VecDeque<f64>,
	capacity: usize,
}

impl LatencyWindow {
	pub fn new(capacity: usize) -> Self {
		Self {
			samples: VecDeque::with_capacity(capacity),
			capacity: capacity.max(1),
		}
	}

	pub fn record(&mut self, latency_ms: f64) {
		if self.samples.len() == self.capacity {
			self.samples.pop_front();
		}
		self.samples.push_back(latency_ms);
	}

	pub fn len(&self) -> usize {
		self.samples.len()
	}

	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}

	pub fn average(&self) -> f64 {
		if self.samples.is_empty() {
			return 0.0;
		}
		self.samples.iter().sum::<f64>() / self.samples.len() as f64
	}

	pub fn min(&self) -> f64 {
		self.samples.iter().copied().reduce(f64::min).unwrap_or(0.0)
	}

	pub fn max(&self) -> f64 {
		self.samples.iter().copied().reduce(f64::max).unwrap_or(0.0)
	}

	/// Nearest-rank percentile, `pct` in `0.0..=100.0`
	pub fn percentile(&self, pct: f64) -> f64 {
		if self.samples.is_empty() {
			return 0.0;
		}
		let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
		sorted.sort_by(f64::total_cmp);
		let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
		sorted[rank.clamp(1, sorted.len()) - 1]
	}
}

/// Query counts bucketed per second over [`QPS_WINDOW`]
///
/// Holds at most one bucket per second of the window, whatever the query
/// rate.
#[derive(Debug, Clone)]
pub struct ThroughputWindow {
	origin: Instant,
	buckets: VecDeque<(u64, u64)>,
}

impl ThroughputWindow {
	pub fn new(origin: Instant) -> Self {
		Self {
			origin,
			buckets: VecDeque::with_capacity(QPS_WINDOW.as_secs() as usize + 1),
		}
	}

	fn second(&self, now: Instant) -> u64 {
		now.saturating_duration_since(self.origin).as_secs()
	}

	pub fn record(&mut self, now: Instant) {
		let second = self.second(now);
		match self.buckets.back_mut() {
			// Late stamps from racing callers land in the newest bucket
			Some((last, count)) if *last >= second => *count += 1,
			_ => self.buckets.push_back((second, 1)),
		}
		self.prune(second);
	}

	fn prune(&mut self, second: u64) {
		let window = QPS_WINDOW.as_secs();
		while let Some(&(oldest, _)) = self.buckets.front() {
			if second.saturating_sub(oldest) >= window {
				self.buckets.pop_front();
			} else {
				break;
			}
		}
	}

	/// Queries counted in the window ending at `now`
	pub fn count(&mut self, now: Instant) -> u64 {
		self.prune(self.second(now));
		self.buckets.iter().map(|(_, count)| count).sum()
	}

	pub fn bucket_count(&self) -> usize {
		self.buckets.len()
	}
}

/// Outcome of one `execute_query` call
#[derive(Debug, Clone, Copy)]
pub struct QueryRecord {
	pub latency: Duration,
	pub query_type: Option<QueryType>,
	pub succeeded: bool,
	pub timed_out: bool,
}

/// Driver-reported connection counts, read outside the metrics lock
#[derive(Debug, Clone, Copy, Default)]
pub struct DriverGauges {
	pub size: u32,
	pub idle: usize,
}

#[derive(Debug, Clone)]
pub struct PoolMetrics {
	pool_type: PoolType,
	max_connections: u32,
	slow_query_threshold: Duration,

	active_connections: u32,
	idle_connections: u32,
	total_connections: u32,
	peak_active: u32,

	total_queries: u64,
	successful_queries: u64,
	failed_queries: u64,
	slow_queries: u64,
	queries_by_type: BTreeMap<QueryType, u64>,
	latency: LatencyWindow,

	timeout_errors: u64,
	pool_exhaustion_events: u64,
	connection_errors: u64,
	query_timeouts: u64,
	circuit_rejections: u64,
	long_lease_warnings: u64,

	health_status: HealthStatus,
	last_health_check: Option<DateTime<Utc>>,
	last_health_check_latency_ms: Option<f64>,
	consecutive_failures: u32,

	breaker: CircuitBreaker,

	throughput: ThroughputWindow,
	queries_per_second: f64,
	peak_qps: f64,

	system: SystemSample,
}

impl PoolMetrics {
	pub fn new(config: &PoolConfiguration) -> Self {
		Self {
			pool_type: config.pool_type,
			max_connections: config.max_connections,
			slow_query_threshold: Duration::from_millis(config.slow_query_threshold_ms),
			active_connections: 0,
			idle_connections: 0,
			total_connections: 0,
			peak_active: 0,
			total_queries: 0,
			successful_queries: 0,
			failed_queries: 0,
			slow_queries: 0,
			queries_by_type: BTreeMap::new(),
			latency: LatencyWindow::new(LATENCY_WINDOW),
			timeout_errors: 0,
			pool_exhaustion_events: 0,
			connection_errors: 0,
			query_timeouts: 0,
			circuit_rejections: 0,
			long_lease_warnings: 0,
			health_status: HealthStatus::Healthy,
			last_health_check: None,
			last_health_check_latency_ms: None,
			consecutive_failures: 0,
			breaker: CircuitBreaker::new(
				config.circuit_breaker_threshold,
				config.circuit_breaker_recovery_time,
				config.half_open_grace_period,
			),
			throughput: ThroughputWindow::new(Instant::now()),
			queries_per_second: 0.0,
			peak_qps: 0.0,
			system: SystemSample::default(),
		}
	}

	pub fn health_status(&self) -> HealthStatus {
		self.health_status
	}

	pub fn set_health_status(&mut self, status: HealthStatus) {
		self.health_status = status;
	}

	pub fn circuit_state(&self) -> CircuitState {
		self.breaker.state()
	}

	pub fn active_connections(&self) -> u32 {
		self.active_connections
	}

	pub fn consecutive_failures(&self) -> u32 {
		self.consecutive_failures
	}

	// Circuit breaker

	/// Evaluate time-driven breaker transitions
	pub fn poll_breaker(&mut self, now: Instant) -> Option<Transition> {
		let transition = self.breaker.poll(now);
		self.apply(transition)
	}

	/// Admit a request, or count a rejection and report the retry delay
	pub fn admit(&mut self, now: Instant) -> (Result<(), Duration>, Option<Transition>) {
		let (decision, transition) = self.breaker.try_pass(now);
		if decision.is_err() {
			self.circuit_rejections += 1;
		}
		(decision, self.apply(transition))
	}

	pub fn record_breaker_failure(&mut self, now: Instant) -> Option<Transition> {
		let transition = self.breaker.record_failure(now);
		self.apply(transition)
	}

	pub fn record_breaker_success(&mut self, now: Instant) -> Option<Transition> {
		let transition = self.breaker.record_success(now);
		self.apply(transition)
	}

	fn apply(&mut self, transition: Option<Transition>) -> Option<Transition> {
		if let Some(Transition { to, .. }) = transition {
			self.health_status = match to {
				CircuitState::Open => HealthStatus::Critical,
				CircuitState::HalfOpen => HealthStatus::Recovering,
				CircuitState::Closed => HealthStatus::Healthy,
			};
		}
		transition
	}

	// Leases

	pub fn lease_started(&mut self) {
		self.active_connections = self.active_connections.saturating_add(1);
		self.peak_active = self.peak_active.max(self.active_connections);
	}

	pub fn lease_finished(&mut self) {
		self.active_connections = self.active_connections.saturating_sub(1);
	}

	pub fn record_acquire_timeout(&mut self) {
		self.timeout_errors += 1;
		self.pool_exhaustion_events += 1;
	}

	pub fn record_connection_error(&mut self) {
		self.connection_errors += 1;
	}

	pub fn record_long_lease(&mut self) {
		self.long_lease_warnings += 1;
	}

	// Queries

	/// Record a finished query; returns `true` if it was slow
	pub fn record_query(&mut self, record: QueryRecord, now: Instant) -> bool {
		self.total_queries += 1;
		if record.succeeded {
			self.successful_queries += 1;
		} else {
			self.failed_queries += 1;
		}
		if record.timed_out {
			self.query_timeouts += 1;
		}
		if let Some(query_type) = record.query_type {
			*self.queries_by_type.entry(query_type).or_insert(0) += 1;
		}

		self.latency.record(record.latency.as_secs_f64() * 1000.0);

		self.throughput.record(now);

		let slow = record.latency > self.slow_query_threshold;
		if slow {
			self.slow_queries += 1;
		}
		slow
	}

	// Health checks

	pub fn record_health_success(&mut self, latency: Duration, now: Instant) {
		self.consecutive_failures = 0;
		self.last_health_check = Some(Utc::now());
		self.last_health_check_latency_ms = Some(latency.as_secs_f64() * 1000.0);
		self.poll_breaker(now);
		self.health_status = match self.breaker.state() {
			CircuitState::Open => HealthStatus::Critical,
			CircuitState::HalfOpen => HealthStatus::Recovering,
			CircuitState::Closed => HealthStatus::from_latency(latency),
		};
	}

	/// Record a failed health check; returns `true` if the pool just
	/// became unavailable
	pub fn record_health_failure(&mut self, failover_threshold: u32, now: Instant) -> bool {
		self.consecutive_failures = self.consecutive_failures.saturating_add(1);
		self.last_health_check = Some(Utc::now());
		self.last_health_check_latency_ms = None;
		self.poll_breaker(now);
		if self.consecutive_failures >= failover_threshold
			&& self.health_status != HealthStatus::Unavailable
		{
			self.health_status = HealthStatus::Unavailable;
			return true;
		}
		false
	}

	// Periodic collection

	/// Recompute throughput over the last minute
	pub fn update_throughput(&mut self, now: Instant) {
		self.queries_per_second = self.throughput.count(now) as f64 / QPS_WINDOW.as_secs_f64();
		self.peak_qps = self.peak_qps.max(self.queries_per_second);
	}

	pub fn refresh_gauges(&mut self, gauges: DriverGauges) {
		let (total, idle) = self.clamp_gauges(gauges);
		self.total_connections = total;
		self.idle_connections = idle;
	}

	pub fn set_system_sample(&mut self, sample: SystemSample) {
		self.system = sample;
	}

	fn clamp_gauges(&self, gauges: DriverGauges) -> (u32, u32) {
		let total = gauges.size.min(self.max_connections);
		let idle = u32::try_from(gauges.idle).unwrap_or(u32::MAX).min(total);
		(total, idle)
	}

	pub fn utilization_percent(&self) -> f64 {
		if self.max_connections == 0 {
			return 0.0;
		}
		(self.active_connections as f64 / self.max_connections as f64 * 100.0).min(100.0)
	}

	pub fn success_rate(&self) -> f64 {
		if self.total_queries == 0 {
			return 100.0;
		}
		self.successful_queries as f64 / self.total_queries as f64 * 100.0
	}

	/// Serializable view of the current state
	///
	/// `gauges` are the live driver counts; when `None` the values from the
	/// last collection are used.
	pub fn snapshot(&self, gauges: Option<DriverGauges>, now: Instant) -> PoolMetricsSnapshot {
		let (total, idle) = match gauges {
			Some(gauges) => self.clamp_gauges(gauges),
			None => (self.total_connections, self.idle_connections),
		};
		let active = self.active_connections.min(total - idle);

		PoolMetricsSnapshot {
			pool_type: self.pool_type,
			captured_at: Utc::now(),
			connections: ConnectionStats {
				active,
				idle,
				total,
				max: self.max_connections,
				peak_active: self.peak_active,
				utilization_percent: self.utilization_percent(),
			},
			performance: PerformanceStats {
				total_queries: self.total_queries,
				successful_queries: self.successful_queries,
				failed_queries: self.failed_queries,
				slow_queries: self.slow_queries,
				success_rate: self.success_rate(),
				avg_latency_ms: self.latency.average(),
				min_latency_ms: self.latency.min(),
				max_latency_ms: self.latency.max(),
				p95_latency_ms: self.latency.percentile(95.0),
				queries_per_second: self.queries_per_second,
				peak_qps: self.peak_qps,
				queries_by_type: self.queries_by_type.clone(),
			},
			errors: ErrorStats {
				timeout_errors: self.timeout_errors,
				pool_exhaustion_events: self.pool_exhaustion_events,
				connection_errors: self.connection_errors,
				query_timeouts: self.query_timeouts,
				circuit_rejections: self.circuit_rejections,
				long_lease_warnings: self.long_lease_warnings,
			},
			health: HealthStats {
				status: self.health_status,
				last_check: self.last_health_check,
				last_check_latency_ms: self.last_health_check_latency_ms,
				consecutive_failures: self.consecutive_failures,
			},
			circuit_breaker: CircuitBreakerStats {
				state: self.breaker.state(),
				failure_count: self.breaker.failure_count(),
				threshold: self.breaker.threshold(),
				seconds_since_last_failure: self
					.breaker
					.last_failure()
					.map(|at| now.saturating_duration_since(at).as_secs_f64()),
			},
			system: self.system,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStats {
	pub active: u32,
	pub idle: u32,
	pub total: u32,
	pub max: u32,
	pub peak_active: u32,
	pub utilization_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
	pub total_queries: u64,
	pub successful_queries: u64,
	pub failed_queries: u64,
	pub slow_queries: u64,
	pub success_rate: f64,
	pub avg_latency_ms: f64,
	pub min_latency_ms: f64,
	pub max_latency_ms: f64,
	pub p95_latency_ms: f64,
	pub queries_per_second: f64,
	pub peak_qps: f64,
	pub queries_by_type: BTreeMap<QueryType, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorStats {
	pub timeout_errors: u64,
	pub pool_exhaustion_events: u64,
	pub connection_errors: u64,
	pub query_timeouts: u64,
	pub circuit_rejections: u64,
	pub long_lease_warnings: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStats {
	pub status: HealthStatus,
	pub last_check: Option<DateTime<Utc>>,
	pub last_check_latency_ms: Option<f64>,
	pub consecutive_failures: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
	pub state: CircuitState,
	pub failure_count: u32,
	pub threshold: u32,
	pub seconds_since_last_failure: Option<f64>,
}

/// Point-in-time view of one pool
#[derive(Debug, Clone, Serialize)]
pub struct PoolMetricsSnapshot {
	pub pool_type: PoolType,
	pub captured_at: DateTime<Utc>,
	pub connections: ConnectionStats,
	pub performance: PerformanceStats,
	pub errors: ErrorStats,
	pub health: HealthStats,
	pub circuit_breaker: CircuitBreakerStats,
	pub system: SystemSample,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	#[fixture]
	fn metrics() -> PoolMetrics {
		PoolMetrics::new(&PoolConfiguration::for_workload(PoolType::Auth))
	}

	fn query(latency_ms: u64, succeeded: bool) -> QueryRecord {
		QueryRecord {
			latency: Duration::from_millis(latency_ms),
			query_type: Some(QueryType::AuthLogin),
			succeeded,
			timed_out: false,
		}
	}

	#[rstest]
	fn test_latency_window_keeps_most_recent_samples() {
		// Arrange
		let mut window = LatencyWindow::new(3);

		// Act
		for ms in [100.0, 1.0, 2.0, 3.0] {
			window.record(ms);
		}

		// Assert
		assert_eq!(window.len(), 3);
		assert_eq!(window.max(), 3.0);
		assert_eq!(window.min(), 1.0);
		assert_eq!(window.average(), 2.0);
	}

	#[rstest]
	fn test_p95_uses_nearest_rank() {
		let mut window = LatencyWindow::new(LATENCY_WINDOW);
		for ms in 1..=100 {
			window.record(ms as f64);
		}

		assert_eq!(window.percentile(95.0), 95.0);
		assert_eq!(window.percentile(100.0), 100.0);
	}

	#[rstest]
	fn test_record_query_flags_slow_queries(mut metrics: PoolMetrics) {
		// Arrange
		let now = Instant::now();

		// Act: the auth threshold is 50ms
		let fast = metrics.record_query(query(10, true), now);
		let slow = metrics.record_query(query(51, true), now);
		metrics.record_query(query(5, false), now);

		// Assert
		let snapshot = metrics.snapshot(None, now);
		assert!(!fast);
		assert!(slow);
		assert_eq!(snapshot.performance.total_queries, 3);
		assert_eq!(snapshot.performance.slow_queries, 1);
		assert_eq!(snapshot.performance.failed_queries, 1);
		assert_eq!(
			snapshot.performance.queries_by_type.get(&QueryType::AuthLogin),
			Some(&3)
		);
	}

	#[rstest]
	fn test_throughput_uses_one_minute_window(mut metrics: PoolMetrics) {
		// Arrange
		let start = Instant::now();
		for _ in 0..60 {
			metrics.record_query(query(1, true), start);
		}
		for _ in 0..30 {
			metrics.record_query(query(1, true), start + Duration::from_secs(90));
		}

		// Act
		metrics.update_throughput(start + Duration::from_secs(90));

		// Assert
		let snapshot = metrics.snapshot(None, start + Duration::from_secs(90));
		assert_eq!(snapshot.performance.queries_per_second, 0.5);
	}

	#[rstest]
	fn test_throughput_is_not_capped_at_high_rates(mut metrics: PoolMetrics) {
		// Arrange: 20k queries inside one second
		let start = Instant::now();
		for _ in 0..20_000 {
			metrics.record_query(query(1, true), start);
		}

		// Act
		metrics.update_throughput(start);

		// Assert
		let performance = metrics.snapshot(None, start).performance;
		assert!((performance.queries_per_second - 20_000.0 / 60.0).abs() < 1e-9);
		assert_eq!(performance.peak_qps, performance.queries_per_second);
	}

	#[rstest]
	fn test_throughput_window_keeps_one_bucket_per_second() {
		let origin = Instant::now();
		let mut window = ThroughputWindow::new(origin);

		for second in 0..300 {
			for _ in 0..10 {
				window.record(origin + Duration::from_secs(second));
			}
		}

		assert_eq!(window.bucket_count(), 60);
		assert_eq!(window.count(origin + Duration::from_secs(299)), 600);
	}

	#[rstest]
	fn test_snapshot_gauges_respect_bounds(mut metrics: PoolMetrics) {
		// Arrange: the driver over-reports relative to configuration
		for _ in 0..5 {
			metrics.lease_started();
		}
		let gauges = DriverGauges { size: 80, idle: 78 };

		// Act
		let snapshot = metrics.snapshot(Some(gauges), Instant::now());

		// Assert
		let connections = snapshot.connections;
		assert_eq!(connections.total, 50);
		assert!(connections.active + connections.idle <= connections.total);
		assert!(connections.total <= connections.max);
	}

	#[rstest]
	fn test_breaker_transitions_drive_health(mut metrics: PoolMetrics) {
		// Arrange
		let now = Instant::now();

		// Act
		for _ in 0..5 {
			metrics.record_breaker_failure(now);
		}

		// Assert
		assert_eq!(metrics.circuit_state(), CircuitState::Open);
		assert_eq!(metrics.health_status(), HealthStatus::Critical);
		let (decision, _) = metrics.admit(now);
		assert!(decision.is_err());
		assert_eq!(metrics.snapshot(None, now).errors.circuit_rejections, 1);
	}

	#[rstest]
	fn test_health_failures_reach_unavailable(mut metrics: PoolMetrics) {
		let now = Instant::now();

		assert!(!metrics.record_health_failure(3, now));
		assert!(!metrics.record_health_failure(3, now));
		assert!(metrics.record_health_failure(3, now));
		assert_eq!(metrics.health_status(), HealthStatus::Unavailable);

		metrics.record_health_success(Duration::from_millis(3), now);
		assert_eq!(metrics.health_status(), HealthStatus::Healthy);
		assert_eq!(metrics.consecutive_failures(), 0);
	}

	#[rstest]
	fn test_snapshot_serializes_sections(metrics: PoolMetrics) {
		let json = serde_json::to_value(metrics.snapshot(None, Instant::now())).unwrap();

		for section in ["connections", "performance", "errors", "health", "circuit_breaker", "system"] {
			assert!(json.get(section).is_some(), "missing section {}", section);
		}
		assert_eq!(json["pool_type"], "auth");
	}
}
