use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Limits enforced by request validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    pub username_max_len: usize,
    pub title_max_len: usize,
    pub page_size_max: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            username_max_len: 5,
            title_max_len: 10,
            page_size_max: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub idle_minutes: i64,
    pub cookie_secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_minutes: 30,
            cookie_secure: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres connection string; `None` selects the in-process store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub session: SessionConfig,
    pub limits: Limits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "0.0.0.0".into(),
            port: 8080,
            db_max_connections: 10,
            session: SessionConfig::default(),
            limits: Limits::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let session = SessionConfig {
            idle_minutes: env_or("SESSION_IDLE_MINUTES", defaults.session.idle_minutes)?,
            cookie_secure: env_or("SESSION_COOKIE_SECURE", defaults.session.cookie_secure)?,
        };
        let limits = Limits {
            username_max_len: env_or("USERNAME_MAX_LEN", defaults.limits.username_max_len)?,
            title_max_len: env_or("TITLE_MAX_LEN", defaults.limits.title_max_len)?,
            page_size_max: env_or("PAGE_SIZE_MAX", defaults.limits.page_size_max)?,
        };
        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or(defaults.host),
            port: env_or("APP_PORT", defaults.port)?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            session,
            limits,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
