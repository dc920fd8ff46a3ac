//! Pool configuration
//!
//! Each workload gets one immutable [`PoolConfiguration`]. The standard
//! profile table ([`ProfileTable::standard`]) holds the six default
//! profiles; callers may replace individual profiles before handing the
//! table to the manager.

use super::workload::PoolType;
use crate::backends::DriverPoolOptions;
use std::collections::BTreeMap;
use std::time::Duration;

/// Per-connection session settings for a workload
///
/// Rendered as PostgreSQL `SET` statements and applied to every new
/// physical connection of the pool.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
	pub application_name: String,
	pub statement_timeout: Option<Duration>,
	pub work_mem: Option<String>,
	pub synchronous_commit: Option<bool>,
	pub default_transaction_read_only: bool,
	pub idle_in_transaction_timeout: Option<Duration>,
	pub jit: Option<bool>,
}

impl SessionSettings {
	pub fn new(application_name: impl Into<String>) -> Self {
		Self {
			application_name: application_name.into(),
			..Default::default()
		}
	}

	pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
		self.statement_timeout = Some(timeout);
		self
	}

	pub fn with_work_mem(mut self, work_mem: impl Into<String>) -> Self {
		self.work_mem = Some(work_mem.into());
		self
	}

	pub fn with_synchronous_commit(mut self, enabled: bool) -> Self {
		self.synchronous_commit = Some(enabled);
		self
	}

	pub fn with_read_only(mut self, read_only: bool) -> Self {
		self.default_transaction_read_only = read_only;
		self
	}

	pub fn with_idle_in_transaction_timeout(mut self, timeout: Duration) -> Self {
		self.idle_in_transaction_timeout = Some(timeout);
		self
	}

	pub fn with_jit(mut self, enabled: bool) -> Self {
		self.jit = Some(enabled);
		self
	}

	/// Render the settings as `SET` statements
	///
	/// # Examples
	///
	/// ```
	/// use strata_db::pool::SessionSettings;
	/// use std::time::Duration;
	///
	/// let settings = SessionSettings::new("strata_auth")
	///     .with_statement_timeout(Duration::from_secs(5))
	///     .with_work_mem("4MB");
	///
	/// assert_eq!(
	///     settings.statements(),
	///     vec![
	///         "SET application_name = 'strata_auth'".to_string(),
	///         "SET statement_timeout = '5000ms'".to_string(),
	///         "SET work_mem = '4MB'".to_string(),
	///     ]
	/// );
	/// ```
	pub fn statements(&self) -> Vec<String> {
		let mut statements = Vec::new();
		if !self.application_name.is_empty() {
			statements.push(format!(
				"SET application_name = '{}'",
				escape_literal(&self.application_name)
			));
		}
		if let Some(timeout) = self.statement_timeout {
			statements.push(format!(
				"SET statement_timeout = '{}ms'",
				timeout.as_millis()
			));
		}
		if let Some(work_mem) = &self.work_mem {
			statements.push(format!("SET work_mem = '{}'", escape_literal(work_mem)));
		}
		if let Some(enabled) = self.synchronous_commit {
			statements.push(format!("SET synchronous_commit = {}", on_off(enabled)));
		}
		if self.default_transaction_read_only {
			statements.push("SET default_transaction_read_only = on".to_string());
		}
		if let Some(timeout) = self.idle_in_transaction_timeout {
			statements.push(format!(
				"SET idle_in_transaction_session_timeout = '{}ms'",
				timeout.as_millis()
			));
		}
		if let Some(enabled) = self.jit {
			statements.push(format!("SET jit = {}", on_off(enabled)));
		}
		statements
	}
}

fn escape_literal(value: &str) -> String {
	value.replace('\'', "''")
}

fn on_off(enabled: bool) -> &'static str {
	if enabled { "on" } else { "off" }
}

/// Static tuning parameters for one pool
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfiguration {
	pub pool_type: PoolType,
	pub min_connections: u32,
	pub max_connections: u32,
	/// Default deadline for leasing a connection
	pub connection_timeout: Duration,
	/// Default deadline for a single query
	pub query_timeout: Duration,
	pub idle_timeout: Duration,
	pub max_connection_lifetime: Duration,
	pub health_check_interval: Duration,
	/// Consecutive health-check failures before the pool is `Unavailable`
	pub failover_threshold: u32,
	/// Consecutive query failures before the breaker opens
	pub circuit_breaker_threshold: u32,
	pub circuit_breaker_recovery_time: Duration,
	pub slow_query_threshold_ms: u64,
	pub health_check_timeout: Duration,
	/// Failure-free half-open time before the breaker closes again
	pub half_open_grace_period: Duration,
	pub metrics_interval: Duration,
	/// Leases held longer than this are logged on release
	pub long_lease_warning: Duration,
	pub session: SessionSettings,
}

impl PoolConfiguration {
	/// Baseline configuration for a pool type, before workload tuning
	pub fn new(pool_type: PoolType) -> Self {
		Self {
			pool_type,
			min_connections: 1,
			max_connections: 10,
			connection_timeout: Duration::from_secs(10),
			query_timeout: Duration::from_secs(30),
			idle_timeout: Duration::from_secs(600),
			max_connection_lifetime: Duration::from_secs(3600),
			health_check_interval: Duration::from_secs(30),
			failover_threshold: 3,
			circuit_breaker_threshold: 5,
			circuit_breaker_recovery_time: Duration::from_secs(60),
			slow_query_threshold_ms: 1000,
			health_check_timeout: Duration::from_secs(5),
			half_open_grace_period: Duration::from_secs(30),
			metrics_interval: Duration::from_secs(60),
			long_lease_warning: Duration::from_secs(300),
			session: SessionSettings::new(format!("strata_{}", pool_type)),
		}
	}

	/// The standard profile for a workload
	///
	/// # Examples
	///
	/// ```
	/// use strata_db::pool::{PoolConfiguration, PoolType};
	///
	/// let auth = PoolConfiguration::for_workload(PoolType::Auth);
	/// assert_eq!(auth.min_connections, 10);
	/// assert_eq!(auth.max_connections, 50);
	/// assert_eq!(auth.slow_query_threshold_ms, 50);
	/// ```
	pub fn for_workload(pool_type: PoolType) -> Self {
		let base = Self::new(pool_type);
		let session = base.session.clone();
		match pool_type {
			PoolType::Auth => base
				.with_connections(10, 50)
				.with_connection_timeout(Duration::from_secs(5))
				.with_query_timeout(Duration::from_secs(10))
				.with_idle_timeout(Duration::from_secs(300))
				.with_max_connection_lifetime(Duration::from_secs(3600))
				.with_health_check_interval(Duration::from_secs(30))
				.with_failover_threshold(3)
				.with_circuit_breaker(5, Duration::from_secs(30))
				.with_slow_query_threshold_ms(50)
				.with_session(
					session
						.with_statement_timeout(Duration::from_secs(5))
						.with_work_mem("4MB")
						.with_idle_in_transaction_timeout(Duration::from_secs(10)),
				),
			PoolType::Read => base
				.with_connections(20, 75)
				.with_connection_timeout(Duration::from_secs(10))
				.with_query_timeout(Duration::from_secs(30))
				.with_idle_timeout(Duration::from_secs(600))
				.with_max_connection_lifetime(Duration::from_secs(3600))
				.with_health_check_interval(Duration::from_secs(30))
				.with_failover_threshold(3)
				.with_circuit_breaker(10, Duration::from_secs(60))
				.with_slow_query_threshold_ms(200)
				.with_session(
					session
						.with_statement_timeout(Duration::from_secs(30))
						.with_work_mem("16MB")
						.with_read_only(true),
				),
			PoolType::Write => base
				.with_connections(5, 25)
				.with_connection_timeout(Duration::from_secs(10))
				.with_query_timeout(Duration::from_secs(30))
				.with_idle_timeout(Duration::from_secs(300))
				.with_max_connection_lifetime(Duration::from_secs(1800))
				.with_health_check_interval(Duration::from_secs(15))
				.with_failover_threshold(2)
				.with_circuit_breaker(5, Duration::from_secs(30))
				.with_slow_query_threshold_ms(500)
				.with_session(
					session
						.with_statement_timeout(Duration::from_secs(30))
						.with_work_mem("8MB")
						.with_synchronous_commit(true)
						.with_idle_in_transaction_timeout(Duration::from_secs(60)),
				),
			PoolType::Analytics => base
				.with_connections(5, 20)
				.with_connection_timeout(Duration::from_secs(30))
				.with_query_timeout(Duration::from_secs(300))
				.with_idle_timeout(Duration::from_secs(900))
				.with_max_connection_lifetime(Duration::from_secs(7200))
				.with_health_check_interval(Duration::from_secs(60))
				.with_failover_threshold(3)
				.with_circuit_breaker(3, Duration::from_secs(120))
				.with_slow_query_threshold_ms(5000)
				.with_session(
					session
						.with_statement_timeout(Duration::from_secs(300))
						.with_work_mem("256MB")
						.with_read_only(true)
						.with_jit(true),
				),
			PoolType::Admin => base
				.with_connections(2, 10)
				.with_connection_timeout(Duration::from_secs(15))
				.with_query_timeout(Duration::from_secs(60))
				.with_idle_timeout(Duration::from_secs(600))
				.with_max_connection_lifetime(Duration::from_secs(3600))
				.with_health_check_interval(Duration::from_secs(60))
				.with_failover_threshold(2)
				.with_circuit_breaker(3, Duration::from_secs(60))
				.with_slow_query_threshold_ms(1000)
				.with_session(
					session
						.with_statement_timeout(Duration::from_secs(60))
						.with_work_mem("32MB"),
				),
			PoolType::Batch => base
				.with_connections(5, 30)
				.with_connection_timeout(Duration::from_secs(30))
				.with_query_timeout(Duration::from_secs(600))
				.with_idle_timeout(Duration::from_secs(900))
				.with_max_connection_lifetime(Duration::from_secs(7200))
				.with_health_check_interval(Duration::from_secs(60))
				.with_failover_threshold(3)
				.with_circuit_breaker(5, Duration::from_secs(120))
				.with_slow_query_threshold_ms(10_000)
				.with_session(
					session
						.with_statement_timeout(Duration::from_secs(600))
						.with_work_mem("128MB")
						.with_synchronous_commit(false),
				),
		}
	}

	pub fn with_connections(mut self, min: u32, max: u32) -> Self {
		self.min_connections = min;
		self.max_connections = max;
		self
	}

	pub fn with_min_connections(mut self, min: u32) -> Self {
		self.min_connections = min;
		self
	}

	pub fn with_max_connections(mut self, max: u32) -> Self {
		self.max_connections = max;
		self
	}

	pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
		self.connection_timeout = timeout;
		self
	}

	pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
		self.query_timeout = timeout;
		self
	}

	pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
		self.idle_timeout = timeout;
		self
	}

	pub fn with_max_connection_lifetime(mut self, lifetime: Duration) -> Self {
		self.max_connection_lifetime = lifetime;
		self
	}

	pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
		self.health_check_interval = interval;
		self
	}

	pub fn with_failover_threshold(mut self, threshold: u32) -> Self {
		self.failover_threshold = threshold;
		self
	}

	pub fn with_circuit_breaker(mut self, threshold: u32, recovery_time: Duration) -> Self {
		self.circuit_breaker_threshold = threshold;
		self.circuit_breaker_recovery_time = recovery_time;
		self
	}

	pub fn with_slow_query_threshold_ms(mut self, threshold_ms: u64) -> Self {
		self.slow_query_threshold_ms = threshold_ms;
		self
	}

	pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
		self.health_check_timeout = timeout;
		self
	}

	pub fn with_half_open_grace_period(mut self, period: Duration) -> Self {
		self.half_open_grace_period = period;
		self
	}

	pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
		self.metrics_interval = interval;
		self
	}

	pub fn with_long_lease_warning(mut self, threshold: Duration) -> Self {
		self.long_lease_warning = threshold;
		self
	}

	pub fn with_session(mut self, session: SessionSettings) -> Self {
		self.session = session;
		self
	}

	pub fn validate(&self) -> Result<(), String> {
		if self.max_connections == 0 {
			return Err(format!("{}: max_connections must be > 0", self.pool_type));
		}
		if self.max_connections < self.min_connections {
			return Err(format!(
				"{}: max_connections must be >= min_connections",
				self.pool_type
			));
		}
		if self.failover_threshold == 0 || self.circuit_breaker_threshold == 0 {
			return Err(format!(
				"{}: failover and circuit breaker thresholds must be > 0",
				self.pool_type
			));
		}
		let timings = [
			("connection_timeout", self.connection_timeout),
			("query_timeout", self.query_timeout),
			("health_check_interval", self.health_check_interval),
			("health_check_timeout", self.health_check_timeout),
			("metrics_interval", self.metrics_interval),
		];
		if let Some((name, _)) = timings.iter().find(|(_, value)| value.is_zero()) {
			return Err(format!("{}: {} must be > 0", self.pool_type, name));
		}
		Ok(())
	}

	/// Options for the driver's pool constructor
	pub fn driver_options(&self) -> DriverPoolOptions {
		DriverPoolOptions {
			min_connections: self.min_connections,
			max_connections: self.max_connections,
			acquire_timeout: self.connection_timeout,
			idle_timeout: Some(self.idle_timeout),
			max_lifetime: Some(self.max_connection_lifetime),
			session_statements: self.session.statements(),
			application_name: self.session.application_name.clone(),
		}
	}
}

/// Profiles for all six pools
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileTable {
	profiles: BTreeMap<PoolType, PoolConfiguration>,
}

impl ProfileTable {
	/// The standard six-workload profile table
	///
	/// # Examples
	///
	/// ```
	/// use strata_db::pool::ProfileTable;
	///
	/// let table = ProfileTable::standard();
	/// assert!(table.total_max_connections() >= 200);
	/// ```
	pub fn standard() -> Self {
		let profiles = PoolType::ALL
			.into_iter()
			.map(|pool_type| (pool_type, PoolConfiguration::for_workload(pool_type)))
			.collect();
		Self { profiles }
	}

	/// Replace the profile for `config.pool_type`
	pub fn with_profile(mut self, config: PoolConfiguration) -> Self {
		self.profiles.insert(config.pool_type, config);
		self
	}

	/// Apply `f` to every profile
	pub fn map_profiles(mut self, mut f: impl FnMut(PoolConfiguration) -> PoolConfiguration) -> Self {
		self.profiles = std::mem::take(&mut self.profiles)
			.into_iter()
			.map(|(pool_type, config)| (pool_type, f(config)))
			.collect();
		self
	}

	pub fn get(&self, pool_type: PoolType) -> Option<&PoolConfiguration> {
		self.profiles.get(&pool_type)
	}

	pub fn iter(&self) -> impl Iterator<Item = &PoolConfiguration> {
		self.profiles.values()
	}

	pub fn total_min_connections(&self) -> u32 {
		self.iter().map(|config| config.min_connections).sum()
	}

	pub fn total_max_connections(&self) -> u32 {
		self.iter().map(|config| config.max_connections).sum()
	}

	pub fn validate(&self) -> Result<(), String> {
		for pool_type in PoolType::ALL {
			let config = self
				.get(pool_type)
				.ok_or_else(|| format!("Missing profile for pool `{}`", pool_type))?;
			if config.pool_type != pool_type {
				return Err(format!(
					"Profile registered under `{}` is configured for `{}`",
					pool_type, config.pool_type
				));
			}
			config.validate()?;
		}
		Ok(())
	}
}

impl Default for ProfileTable {
	fn default() -> Self {
		Self::standard()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(PoolType::Auth, 10, 50)]
	#[case(PoolType::Read, 20, 75)]
	#[case(PoolType::Write, 5, 25)]
	#[case(PoolType::Analytics, 5, 20)]
	#[case(PoolType::Admin, 2, 10)]
	#[case(PoolType::Batch, 5, 30)]
	fn test_standard_profile_sizes(#[case] pool_type: PoolType, #[case] min: u32, #[case] max: u32) {
		// Act
		let config = PoolConfiguration::for_workload(pool_type);

		// Assert
		assert_eq!(config.pool_type, pool_type);
		assert_eq!(config.min_connections, min);
		assert_eq!(config.max_connections, max);
		assert!(config.validate().is_ok());
	}

	#[rstest]
	fn test_standard_table_meets_capacity_target() {
		let table = ProfileTable::standard();

		assert_eq!(table.total_max_connections(), 210);
		assert_eq!(table.total_min_connections(), 47);
		assert!(table.validate().is_ok());
	}

	#[rstest]
	fn test_validate_rejects_inverted_bounds() {
		// Arrange
		let config = PoolConfiguration::new(PoolType::Write).with_connections(10, 5);

		// Act
		let result = config.validate();

		// Assert
		assert!(result.unwrap_err().contains("max_connections must be >= min_connections"));
	}

	#[rstest]
	fn test_validate_rejects_zero_timeouts() {
		let config = PoolConfiguration::new(PoolType::Read).with_query_timeout(Duration::ZERO);

		assert!(config.validate().unwrap_err().contains("query_timeout"));
	}

	#[rstest]
	fn test_table_validate_rejects_mislabelled_profile() {
		// Arrange
		let mut table = ProfileTable::standard();
		table
			.profiles
			.insert(PoolType::Admin, PoolConfiguration::new(PoolType::Batch));

		// Act & Assert
		assert!(table.validate().is_err());
	}

	#[rstest]
	fn test_batch_session_relaxes_durability() {
		let statements = PoolConfiguration::for_workload(PoolType::Batch)
			.session
			.statements();

		assert!(statements.contains(&"SET synchronous_commit = off".to_string()));
		assert!(statements.contains(&"SET work_mem = '128MB'".to_string()));
	}

	#[rstest]
	fn test_session_literals_are_escaped() {
		let settings = SessionSettings::new("o'brien");

		assert_eq!(
			settings.statements(),
			vec!["SET application_name = 'o''brien'".to_string()]
		);
	}

	#[rstest]
	fn test_driver_options_follow_configuration() {
		// Arrange
		let config = PoolConfiguration::for_workload(PoolType::Auth);

		// Act
		let options = config.driver_options();

		// Assert
		assert_eq!(options.min_connections, 10);
		assert_eq!(options.max_connections, 50);
		assert_eq!(options.acquire_timeout, Duration::from_secs(5));
		assert_eq!(options.application_name, "strata_auth");
		assert!(!options.session_statements.is_empty());
	}
}
