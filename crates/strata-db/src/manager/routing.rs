//! Query routing and failover

use crate::pool::{HealthStatus, PoolType, QueryType};

/// Static `QueryType -> PoolType` routing table
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingTable;

impl RoutingTable {
	/// Preferred pool for a declared query type
	pub fn pool_for(query_type: QueryType) -> PoolType {
		use QueryType::*;

		match query_type {
			AuthLogin | AuthTokenValidation | AuthSession | AuthPermissionCheck => PoolType::Auth,
			UserLookup | ReadSimple | ReadComplex | Search => PoolType::Read,
			WriteInsert | WriteUpdate | WriteDelete | Transaction => PoolType::Write,
			AnalyticsReport | AnalyticsAggregate | Dashboard => PoolType::Analytics,
			AdminOperation | AdminMaintenance => PoolType::Admin,
			BatchImport | BatchExport | BatchProcessing => PoolType::Batch,
		}
	}
}

/// Static ordered backups per pool
#[derive(Debug, Clone, Copy, Default)]
pub struct FailoverGraph;

impl FailoverGraph {
	pub fn backups(pool_type: PoolType) -> &'static [PoolType] {
		match pool_type {
			PoolType::Auth => &[PoolType::Read],
			PoolType::Read => &[PoolType::Auth],
			PoolType::Write => &[PoolType::Batch],
			PoolType::Batch => &[PoolType::Write],
			PoolType::Analytics => &[PoolType::Read],
			PoolType::Admin => &[PoolType::Read],
		}
	}
}

/// The pool a request asks for, before health is considered
///
/// An explicit pool type wins over the query type; with neither, the
/// read pool is used.
pub fn preferred_pool(pool_type: Option<PoolType>, query_type: Option<QueryType>) -> PoolType {
	pool_type
		.or_else(|| query_type.map(RoutingTable::pool_for))
		.unwrap_or(PoolType::Read)
}

/// Pick the pool that should serve a request for `preferred`
///
/// An unavailable pool is swapped for its first routable backup. When no
/// backup qualifies the preferred pool is returned anyway, so the caller
/// sees that pool's own error rather than a routing failure.
pub fn select_pool(
	preferred: PoolType,
	status_of: impl Fn(PoolType) -> Option<HealthStatus>,
) -> PoolType {
	if status_of(preferred) != Some(HealthStatus::Unavailable) {
		return preferred;
	}
	FailoverGraph::backups(preferred)
		.iter()
		.copied()
		.find(|backup| status_of(*backup).is_some_and(|status| status.is_routable()))
		.unwrap_or(preferred)
}
