//! Database driver abstraction
//!
//! - `driver`: the traits pools are written against
//! - `types`: parameter and row values
//! - `any`: the `sqlx::AnyPool` implementation

pub mod any;
pub mod driver;
pub mod types;

pub use any::{AnyDriverConnection, AnyPoolDriver, SqlxConnector};
pub use driver::{
	Connector, DriverConnection, DriverError, DriverPoolOptions, DriverResult, PoolDriver,
};
pub use types::{QueryValue, Row};
