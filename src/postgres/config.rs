use std::time::Duration;

use deadpool_postgres::{Config as PgConfig, ManagerConfig, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::error::AdapterError;

use super::PgConnPool;

/// Options for building a Postgres-backed [`PgConnPool`].
///
/// Connection details live in the wrapped `deadpool_postgres::Config`, either as a `url` or as
/// discrete fields.
#[derive(Debug, Clone)]
pub struct PgOptions {
    pub config: PgConfig,
    pub max_size: Option<usize>,
    pub wait_timeout: Option<Duration>,
    pub verify_on_recycle: bool,
}

impl PgOptions {
    #[must_use]
    pub fn new(config: PgConfig) -> Self {
        Self {
            config,
            max_size: None,
            wait_timeout: None,
            verify_on_recycle: false,
        }
    }

    /// Options from a `postgres://` URL or a libpq key/value string.
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        let mut config = PgConfig::new();
        config.url = Some(url.into());
        Self::new(config)
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// How long `acquire` and the pool-level calls wait for a free connection.
    #[must_use]
    pub fn with_wait_timeout(mut self, wait_timeout: Duration) -> Self {
        self.wait_timeout = Some(wait_timeout);
        self
    }

    /// Run a test query before handing a recycled connection out again.
    #[must_use]
    pub fn with_verified_recycling(mut self, verify: bool) -> Self {
        self.verify_on_recycle = verify;
        self
    }

    fn validate(&self) -> Result<(), AdapterError> {
        if self.config.url.is_some() {
            return Ok(());
        }
        if self.config.dbname.is_none() {
            return Err(AdapterError::ConfigError("dbname is required".to_string()));
        }
        if self.config.host.is_none() && self.config.hosts.is_none() {
            return Err(AdapterError::ConfigError("host is required".to_string()));
        }
        if self.config.user.is_none() {
            return Err(AdapterError::ConfigError("user is required".to_string()));
        }
        if self.max_size == Some(0) {
            return Err(AdapterError::ConfigError(
                "max_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the pool. Connections are opened lazily on first use.
    ///
    /// # Errors
    /// Returns `AdapterError::ConfigError` if required fields are missing or
    /// `AdapterError::ConnectionError` if pool creation fails.
    pub fn build(self) -> Result<PgConnPool, AdapterError> {
        self.validate()?;

        let mut config = self.config;
        let mut manager = config.manager.unwrap_or_default();
        manager.recycling_method = if self.verify_on_recycle {
            RecyclingMethod::Verified
        } else {
            RecyclingMethod::Fast
        };
        config.manager = Some(ManagerConfig { ..manager });

        if self.max_size.is_some() || self.wait_timeout.is_some() {
            let mut pool_config = config.get_pool_config();
            if let Some(max_size) = self.max_size {
                pool_config.max_size = max_size;
            }
            if self.wait_timeout.is_some() {
                pool_config.timeouts.wait = self.wait_timeout;
            }
            config.pool = Some(pool_config);
        }

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| {
                AdapterError::ConnectionError(format!("Failed to create Postgres pool: {e}"))
            })?;

        Ok(PgConnPool::new(pool))
    }
}
