//! Scripted driver for pool and manager tests
//!
//! Behaves like a bounded connection pool whose failures are switched on
//! and off by the test through [`Script`].

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use strata_db::backends::{
	Connector, DriverConnection, DriverError, DriverPoolOptions, DriverResult, PoolDriver,
	QueryValue, Row,
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Default)]
pub struct Script {
	/// Application names whose `connect` fails
	pub refuse_connect: Mutex<HashSet<String>>,
	pub fail_queries: AtomicBool,
	pub fail_probes: AtomicBool,
	pub hang_acquire: AtomicBool,
	pub query_delay: Mutex<Duration>,
	pub connect_calls: AtomicUsize,
	pub acquire_calls: AtomicUsize,
}

impl Script {
	pub fn refuse(&self, application_name: &str) {
		self.refuse_connect.lock().insert(application_name.to_string());
	}

	pub fn set_fail_queries(&self, fail: bool) {
		self.fail_queries.store(fail, Ordering::SeqCst);
	}

	pub fn set_fail_probes(&self, fail: bool) {
		self.fail_probes.store(fail, Ordering::SeqCst);
	}

	pub fn set_hang_acquire(&self, hang: bool) {
		self.hang_acquire.store(hang, Ordering::SeqCst);
	}

	pub fn set_query_delay(&self, delay: Duration) {
		*self.query_delay.lock() = delay;
	}

	pub fn connects(&self) -> usize {
		self.connect_calls.load(Ordering::SeqCst)
	}

	pub fn acquires(&self) -> usize {
		self.acquire_calls.load(Ordering::SeqCst)
	}
}

#[derive(Default)]
pub struct ScriptedConnector {
	pub script: Arc<Script>,
}

impl ScriptedConnector {
	pub fn new() -> (Arc<Self>, Arc<Script>) {
		let connector = Arc::new(Self::default());
		let script = Arc::clone(&connector.script);
		(connector, script)
	}
}

#[async_trait]
impl Connector for ScriptedConnector {
	type Pool = ScriptedPool;

	async fn connect(&self, _dsn: &str, options: &DriverPoolOptions) -> DriverResult<ScriptedPool> {
		self.script.connect_calls.fetch_add(1, Ordering::SeqCst);
		if self.script.refuse_connect.lock().contains(&options.application_name) {
			return Err(DriverError::Connection("connection refused".to_string()));
		}
		Ok(ScriptedPool {
			script: Arc::clone(&self.script),
			slots: Arc::new(Semaphore::new(options.max_connections as usize)),
			min: options.min_connections,
			max: options.max_connections,
			in_use: Arc::new(AtomicU32::new(0)),
		})
	}
}

pub struct ScriptedPool {
	script: Arc<Script>,
	slots: Arc<Semaphore>,
	min: u32,
	max: u32,
	in_use: Arc<AtomicU32>,
}

#[async_trait]
impl PoolDriver for ScriptedPool {
	type Connection = ScriptedConnection;

	async fn acquire(&self) -> DriverResult<ScriptedConnection> {
		self.script.acquire_calls.fetch_add(1, Ordering::SeqCst);
		if self.script.hang_acquire.load(Ordering::SeqCst) {
			std::future::pending::<()>().await;
		}
		let permit = Arc::clone(&self.slots)
			.acquire_owned()
			.await
			.map_err(|_| DriverError::PoolClosed)?;
		self.in_use.fetch_add(1, Ordering::SeqCst);
		Ok(ScriptedConnection {
			script: Arc::clone(&self.script),
			in_use: Arc::clone(&self.in_use),
			_permit: permit,
		})
	}

	fn size(&self) -> u32 {
		self.in_use.load(Ordering::SeqCst).max(self.min).min(self.max)
	}

	fn num_idle(&self) -> usize {
		(self.size() - self.in_use.load(Ordering::SeqCst).min(self.size())) as usize
	}

	async fn close(&self) {
		self.slots.close();
	}
}

pub struct ScriptedConnection {
	script: Arc<Script>,
	in_use: Arc<AtomicU32>,
	_permit: OwnedSemaphorePermit,
}

impl Drop for ScriptedConnection {
	fn drop(&mut self) {
		self.in_use.fetch_sub(1, Ordering::SeqCst);
	}
}

#[async_trait]
impl DriverConnection for ScriptedConnection {
	async fn execute(&mut self, _sql: &str) -> DriverResult<u64> {
		if self.script.fail_probes.load(Ordering::SeqCst) {
			return Err(DriverError::Connection("server closed the connection".to_string()));
		}
		Ok(0)
	}

	async fn fetch(&mut self, _sql: &str, args: &[QueryValue]) -> DriverResult<Vec<Row>> {
		let delay = *self.script.query_delay.lock();
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		if self.script.fail_queries.load(Ordering::SeqCst) {
			return Err(DriverError::Query("relation \"missing\" does not exist".to_string()));
		}
		let mut row = Row::new();
		row.insert("ok", QueryValue::Int(1));
		row.insert("args", QueryValue::Int(args.len() as i64));
		Ok(vec![row])
	}
}
