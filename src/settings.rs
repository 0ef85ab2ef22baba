//! Process settings from the environment (after `dotenvy`).

use crate::error::ConfigError;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            _ => Err(ConfigError::InvalidSetting {
                key: "NAVIWATCH_STORE",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub store: StoreKind,
    pub database_url: String,
    /// Schema holding the entity tables.
    pub schema: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub pool_max_lifetime: Option<Duration>,
    pub body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("NAVIWATCH_STORE") {
            Some(v) => v.parse()?,
            None => StoreKind::Postgres,
        };
        let schema = lookup("NAVIWATCH_SCHEMA").unwrap_or_else(|| "naviwatch".into());
        if schema.is_empty() || !schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidSetting {
                key: "NAVIWATCH_SCHEMA",
                value: schema,
            });
        }
        Ok(Settings {
            store,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/naviwatch".into()),
            schema,
            host: parsed(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parsed(&lookup, "PORT", 5055)?,
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            pool_max_lifetime: lookup("DB_POOL_MAX_LIFETIME_SECS")
                .map(|v| {
                    v.parse::<u64>().map(Duration::from_secs).map_err(|_| ConfigError::InvalidSetting {
                        key: "DB_POOL_MAX_LIFETIME_SECS",
                        value: v,
                    })
                })
                .transpose()?,
            body_limit_bytes: parsed(&lookup, "BODY_LIMIT_BYTES", 1024 * 1024)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parsed<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidSetting { key, value: v }),
    }
}
