//! Storage backend configuration.
//!
//! # Environment Variables
//!
//! - `STORAGE_BACKEND`: `memory` (default) or `postgres`
//! - `DATABASE_URL`: PostgreSQL connection string, required for `postgres`
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `SEED_DEFAULT_ROLES`: insert the built-in roles at startup (default: true)

use std::env;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(Self::Memory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(anyhow!("unknown storage backend '{}'", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_default_roles: bool,
}

impl StorageConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse()?,
            Err(_) => StorageBackend::default(),
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|u| !u.is_empty());

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5);

        let seed_default_roles = crate::parse_bool(
            env::var("SEED_DEFAULT_ROLES").ok().as_deref(),
            true,
        );

        let config = Self {
            backend,
            database_url,
            max_connections,
            seed_default_roles,
        };
        config.check()?;
        Ok(config)
    }

    /// The database URL, failing when the postgres backend lacks one.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL must be set for the postgres storage backend"))
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.max_connections == 0 {
            bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        if self.backend == StorageBackend::Postgres {
            self.require_database_url()?;
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            max_connections: 5,
            seed_default_roles: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(
            "PostgreSQL".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert!("mysql".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_postgres_requires_url() {
        let config = StorageConfig {
            backend: StorageBackend::Postgres,
            ..StorageConfig::default()
        };
        assert!(config.check().is_err());

        let config = StorageConfig {
            backend: StorageBackend::Postgres,
            database_url: Some("postgres://localhost/registrar".to_string()),
            ..StorageConfig::default()
        };
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = StorageConfig {
            max_connections: 0,
            ..StorageConfig::default()
        };
        assert!(config.check().is_err());
    }
}
