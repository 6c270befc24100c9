//! Leave accounting service for the HRM system.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod leave;
pub mod model;
pub mod models;
pub mod repository;
pub mod routes;

use config::{Config, LeaveStore};
use leave::{LeaveService, LogNotifier};
use repository::{LeaveRepository, MemoryLeaveRepository, MySqlLeaveRepository};

/// Wires the leave service to the store selected by `config`.
pub async fn build_service(config: &Config) -> anyhow::Result<LeaveService> {
    let repository: Arc<dyn LeaveRepository> = match config.leave_store {
        LeaveStore::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when LEAVE_STORE=mysql")?;
            let pool = db::init_db(url)
                .await
                .context("Failed to connect to database")?;
            Arc::new(MySqlLeaveRepository::new(pool))
        }
        LeaveStore::Memory => Arc::new(MemoryLeaveRepository::new()),
    };
    info!(store = ?config.leave_store, "Leave store ready");

    Ok(LeaveService::new(repository, Arc::new(LogNotifier))
        .with_policy_ttl(Duration::from_secs(config.policy_cache_ttl_secs))
        .with_notify_attempts(config.notify_attempts))
}
