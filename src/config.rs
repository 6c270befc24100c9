use std::env;
use std::str::FromStr;

use anyhow::{Context, bail};
use dotenvy::dotenv;

/// Backing store for leave data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveStore {
    MySql,
    Memory,
}

impl FromStr for LeaveStore {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(LeaveStore::MySql),
            "memory" => Ok(LeaveStore::Memory),
            other => bail!("LEAVE_STORE must be 'mysql' or 'memory', got '{other}'"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub leave_store: LeaveStore,
    /// Required only for the MySQL store
    pub database_url: Option<String>,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub policy_cache_ttl_secs: u64,
    pub notify_attempts: u32,
    pub log_dir: String,
}

fn var_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let leave_store = match env::var("LEAVE_STORE") {
            Ok(raw) => raw.parse()?,
            Err(_) => LeaveStore::MySql,
        };

        let database_url = env::var("DATABASE_URL").ok();
        if leave_store == LeaveStore::MySql && database_url.is_none() {
            bail!("DATABASE_URL must be set when LEAVE_STORE=mysql");
        }

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            leave_store,
            database_url,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,
            policy_cache_ttl_secs: var_or("POLICY_CACHE_TTL_SECS", 300)?,
            notify_attempts: var_or("NOTIFY_ATTEMPTS", 3)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    /// In-memory settings for tests and local runs.
    pub fn local(jwt_secret: impl Into<String>) -> Self {
        Self {
            server_addr: "127.0.0.1:8080".to_string(),
            jwt_secret: jwt_secret.into(),
            leave_store: LeaveStore::Memory,
            database_url: None,
            api_prefix: "/api".to_string(),
            rate_protected_per_min: 1000,
            policy_cache_ttl_secs: 300,
            notify_attempts: 3,
            log_dir: "logs".to_string(),
        }
    }
}
