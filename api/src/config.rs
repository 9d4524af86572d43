//! Service configuration sourced from environment variables.

use anyhow::{bail, Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use streetsavvy_promotions::infrastructure::PostgresConfig;
use tracing::info;

/// Which store backs the services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Seeded demo data, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown store backend {other:?} (expected postgres or memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub postgres: PostgresConfig,
    pub preference_queue_capacity: usize,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| -> String {
            match lookup(key) {
                Some(value) => value,
                None => {
                    if key != "DB_PASSWORD" {
                        info!("{key} not set, using default {default:?}");
                    }
                    default.to_string()
                }
            }
        };

        let ip: IpAddr = var("BIND_ADDR", "0.0.0.0").parse().context("parse BIND_ADDR")?;
        let port: u16 = var("PORT", "8080").parse().context("parse PORT")?;
        let store = var("STREETSAVVY_STORE", "postgres")
            .parse()
            .context("parse STREETSAVVY_STORE")?;

        let defaults = PostgresConfig::default();
        let postgres = PostgresConfig {
            host: var("DB_HOST", &defaults.host),
            port: var("DB_PORT", "5432").parse().context("parse DB_PORT")?,
            user: var("DB_USER", &defaults.user),
            password: var("DB_PASSWORD", ""),
            database: var("DB_NAME", &defaults.database),
            sslmode: var("DB_SSLMODE", &defaults.sslmode),
            max_connections: var("DB_MAX_CONNECTIONS", "25")
                .parse()
                .context("parse DB_MAX_CONNECTIONS")?,
            min_connections: var("DB_MIN_IDLE", "5").parse().context("parse DB_MIN_IDLE")?,
            max_lifetime: Duration::from_secs(
                var("DB_MAX_LIFETIME_SECS", "300")
                    .parse()
                    .context("parse DB_MAX_LIFETIME_SECS")?,
            ),
            acquire_timeout: Duration::from_millis(
                var("DB_ACQUIRE_TIMEOUT_MS", "5000")
                    .parse()
                    .context("parse DB_ACQUIRE_TIMEOUT_MS")?,
            ),
            run_migrations: var("DB_RUN_MIGRATIONS", "true")
                .parse()
                .context("parse DB_RUN_MIGRATIONS")?,
        };

        let preference_queue_capacity = var("PREFERENCE_QUEUE_CAPACITY", "1024")
            .parse()
            .context("parse PREFERENCE_QUEUE_CAPACITY")?;

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            store,
            postgres,
            preference_queue_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.postgres.max_connections, 25);
        assert_eq!(cfg.postgres.min_connections, 5);
        assert_eq!(cfg.postgres.max_lifetime, Duration::from_secs(300));
        assert_eq!(cfg.postgres.acquire_timeout, Duration::from_millis(5000));
        assert!(cfg.postgres.run_migrations);
        assert_eq!(cfg.preference_queue_capacity, 1024);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("PORT", "9000"),
            ("BIND_ADDR", "127.0.0.1"),
            ("STREETSAVVY_STORE", "Memory"),
            ("DB_HOST", "db.internal"),
            ("DB_PASSWORD", "secret"),
            ("DB_RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.postgres.host, "db.internal");
        assert_eq!(cfg.postgres.password, "secret");
        assert!(!cfg.postgres.run_migrations);
    }

    #[test]
    fn test_invalid_values() {
        assert!(config(&[("PORT", "eighty")]).is_err());
        assert!(config(&[("STREETSAVVY_STORE", "redis")]).is_err());
        assert!(config(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
    }
}
