//! # Strata Configuration
//!
//! Loads [`Settings`] for an
//! [`EnterpriseConnectionPoolManager`](strata_db::manager::EnterpriseConnectionPoolManager)
//! from, in increasing priority:
//!
//! 1. the built-in workload profiles
//! 2. a TOML file
//! 3. `STRATA_`-prefixed environment variables (optionally from a `.env` file)
//!
//! ```rust,no_run
//! use strata_conf::Settings;
//!
//! # fn example() -> Result<(), strata_conf::ConfError> {
//! let settings = Settings::load(Some("strata.toml".as_ref()))?;
//! let config = settings.into_manager_config()?;
//! let url = settings.database_url()?;
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod error;
pub mod settings;

pub use env::EnvSource;
pub use error::{ConfError, ConfResult};
pub use settings::{MonitoringSettings, PoolOverrides, Settings};
