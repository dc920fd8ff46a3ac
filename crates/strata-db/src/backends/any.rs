//! `sqlx::AnyPool` implementation of the driver seam
//!
//! One driver covers every backend compiled into sqlx (`postgres`, `sqlite`,
//! `mysql` cargo features). Session statements are only sent to PostgreSQL
//! connections, since they are rendered as PostgreSQL `SET` commands.
//!
//! Statements carry no deadline here; the owning pool bounds every call.

use super::driver::{
	Connector, DriverConnection, DriverError, DriverPoolOptions, DriverResult, PoolDriver,
};
use super::types::{QueryValue, Row};
use async_trait::async_trait;
use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool, Column, Executor, ValueRef};
use std::sync::Arc;

const POSTGRES_BACKEND: &str = "PostgreSQL";

/// Connector producing [`AnyPoolDriver`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

impl SqlxConnector {
	pub fn new() -> Self {
		sqlx::any::install_default_drivers();
		Self
	}
}

#[async_trait]
impl Connector for SqlxConnector {
	type Pool = AnyPoolDriver;

	async fn connect(&self, dsn: &str, options: &DriverPoolOptions) -> DriverResult<AnyPoolDriver> {
		sqlx::any::install_default_drivers();
		tracing::debug!(
			application_name = %options.application_name,
			min_connections = options.min_connections,
			max_connections = options.max_connections,
			"Opening sqlx pool"
		);

		let statements = Arc::new(options.session_statements.clone());
		let pool = AnyPoolOptions::new()
			.min_connections(options.min_connections)
			.max_connections(options.max_connections)
			.acquire_timeout(options.acquire_timeout)
			.idle_timeout(options.idle_timeout)
			.max_lifetime(options.max_lifetime)
			.after_connect(move |conn, _meta| {
				let statements = Arc::clone(&statements);
				Box::pin(async move {
					if conn.backend_name() != POSTGRES_BACKEND {
						return Ok(());
					}
					for statement in statements.iter() {
						(&mut *conn).execute(statement.as_str()).await?;
					}
					Ok(())
				})
			})
			.connect(dsn)
			.await?;

		Ok(AnyPoolDriver { pool })
	}
}

/// Driver pool backed by `sqlx::AnyPool`
#[derive(Debug, Clone)]
pub struct AnyPoolDriver {
	pool: AnyPool,
}

#[async_trait]
impl PoolDriver for AnyPoolDriver {
	type Connection = AnyDriverConnection;

	async fn acquire(&self) -> DriverResult<AnyDriverConnection> {
		let conn = self.pool.acquire().await?;
		Ok(AnyDriverConnection { conn })
	}

	fn size(&self) -> u32 {
		self.pool.size()
	}

	fn num_idle(&self) -> usize {
		self.pool.num_idle()
	}

	async fn close(&self) {
		self.pool.close().await;
	}
}

/// Connection leased from an [`AnyPoolDriver`]
pub struct AnyDriverConnection {
	conn: PoolConnection<Any>,
}

impl AnyDriverConnection {
	fn bind_value<'q>(
		query: sqlx::query::Query<'q, Any, AnyArguments<'q>>,
		value: &'q QueryValue,
	) -> sqlx::query::Query<'q, Any, AnyArguments<'q>> {
		match value {
			QueryValue::Null => query.bind(None::<i64>),
			QueryValue::Bool(b) => query.bind(*b),
			QueryValue::Int(i) => query.bind(*i),
			QueryValue::Float(f) => query.bind(*f),
			QueryValue::String(s) => query.bind(s.as_str()),
			QueryValue::Bytes(b) => query.bind(b.as_slice()),
			QueryValue::Timestamp(dt) => query.bind(dt.to_rfc3339()),
		}
	}

	fn convert_row(any_row: &AnyRow) -> DriverResult<Row> {
		use sqlx::Row as SqlxRow;

		let mut row = Row::new();
		for column in any_row.columns() {
			let name = column.name();
			let index = column.ordinal();

			if any_row.try_get_raw(index)?.is_null() {
				row.insert(name, QueryValue::Null);
			} else if let Ok(value) = any_row.try_get::<bool, _>(index) {
				row.insert(name, QueryValue::Bool(value));
			} else if let Ok(value) = any_row.try_get::<i64, _>(index) {
				row.insert(name, QueryValue::Int(value));
			} else if let Ok(value) = any_row.try_get::<f64, _>(index) {
				row.insert(name, QueryValue::Float(value));
			} else if let Ok(value) = any_row.try_get::<String, _>(index) {
				row.insert(name, QueryValue::String(value));
			} else if let Ok(value) = any_row.try_get::<Vec<u8>, _>(index) {
				row.insert(name, QueryValue::Bytes(value));
			} else {
				return Err(DriverError::Query(format!(
					"Unsupported value type in column `{}`",
					name
				)));
			}
		}
		Ok(row)
	}
}

#[async_trait]
impl DriverConnection for AnyDriverConnection {
	async fn execute(&mut self, sql: &str) -> DriverResult<u64> {
		let result = (&mut *self.conn).execute(sql).await?;
		Ok(result.rows_affected())
	}

	async fn fetch(&mut self, sql: &str, args: &[QueryValue]) -> DriverResult<Vec<Row>> {
		let mut query = sqlx::query(sql);
		for arg in args {
			query = Self::bind_value(query, arg);
		}

		let rows = query.fetch_all(&mut *self.conn).await?;
		rows.iter().map(Self::convert_row).collect()
	}
}
