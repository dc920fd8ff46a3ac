//! Workload classification: pool types and declared query types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six workload-specialized pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolType {
	Auth,
	Read,
	Write,
	Analytics,
	Admin,
	Batch,
}

impl PoolType {
	pub const ALL: [PoolType; 6] = [
		PoolType::Auth,
		PoolType::Read,
		PoolType::Write,
		PoolType::Analytics,
		PoolType::Admin,
		PoolType::Batch,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			PoolType::Auth => "auth",
			PoolType::Read => "read",
			PoolType::Write => "write",
			PoolType::Analytics => "analytics",
			PoolType::Admin => "admin",
			PoolType::Batch => "batch",
		}
	}
}

impl fmt::Display for PoolType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for PoolType {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		PoolType::ALL
			.into_iter()
			.find(|pool| pool.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| format!("Unknown pool type: {}", s))
	}
}

/// Workload declared by the caller for a query
///
/// Used to pick a pool through the routing table and to label per-pool
/// query counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
	AuthLogin,
	AuthTokenValidation,
	AuthSession,
	AuthPermissionCheck,
	UserLookup,
	ReadSimple,
	ReadComplex,
	Search,
	WriteInsert,
	WriteUpdate,
	WriteDelete,
	Transaction,
	AnalyticsReport,
	AnalyticsAggregate,
	Dashboard,
	AdminOperation,
	AdminMaintenance,
	BatchImport,
	BatchExport,
	BatchProcessing,
}

impl QueryType {
	pub const ALL: [QueryType; 20] = [
		QueryType::AuthLogin,
		QueryType::AuthTokenValidation,
		QueryType::AuthSession,
		QueryType::AuthPermissionCheck,
		QueryType::UserLookup,
		QueryType::ReadSimple,
		QueryType::ReadComplex,
		QueryType::Search,
		QueryType::WriteInsert,
		QueryType::WriteUpdate,
		QueryType::WriteDelete,
		QueryType::Transaction,
		QueryType::AnalyticsReport,
		QueryType::AnalyticsAggregate,
		QueryType::Dashboard,
		QueryType::AdminOperation,
		QueryType::AdminMaintenance,
		QueryType::BatchImport,
		QueryType::BatchExport,
		QueryType::BatchProcessing,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			QueryType::AuthLogin => "auth_login",
			QueryType::AuthTokenValidation => "auth_token_validation",
			QueryType::AuthSession => "auth_session",
			QueryType::AuthPermissionCheck => "auth_permission_check",
			QueryType::UserLookup => "user_lookup",
			QueryType::ReadSimple => "read_simple",
			QueryType::ReadComplex => "read_complex",
			QueryType::Search => "search",
			QueryType::WriteInsert => "write_insert",
			QueryType::WriteUpdate => "write_update",
			QueryType::WriteDelete => "write_delete",
			QueryType::Transaction => "transaction",
			QueryType::AnalyticsReport => "analytics_report",
			QueryType::AnalyticsAggregate => "analytics_aggregate",
			QueryType::Dashboard => "dashboard",
			QueryType::AdminOperation => "admin_operation",
			QueryType::AdminMaintenance => "admin_maintenance",
			QueryType::BatchImport => "batch_import",
			QueryType::BatchExport => "batch_export",
			QueryType::BatchProcessing => "batch_processing",
		}
	}
}

impl fmt::Display for QueryType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
