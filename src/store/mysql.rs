//! MySQL-backed result store.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::time::Duration;

use super::{DbConfig, ResultStore, StoredRow};
use crate::error::{Error, Result};
use crate::pipeline::MatchResult;

const INSERT_ROW: &str = r#"
    INSERT INTO subdomains (id, subdomain, ip, region, service, tag)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

/// How long a queued insert waits for the shared connection.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(300);

/// Store writing one row per match into the `subdomains` table.
///
/// A single connection is opened up front and shared by every task; sqlx
/// queues concurrent inserts on it. An insert still waiting for the
/// connection after [`ACQUIRE_TIMEOUT`] fails and its row is lost, so very
/// large scans against a slow server can drop rows.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
    tag: String,
}

impl MySqlStore {
    /// Connect to the configured server.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(Error::Connection)?;

        log::info!(
            "Connected to MySQL at {}:{}/{}",
            config.host,
            config.port,
            config.database
        );

        Ok(Self {
            pool,
            tag: config.tag.clone(),
        })
    }
}

#[async_trait]
impl ResultStore for MySqlStore {
    async fn insert(&self, result: &MatchResult) -> Result<()> {
        let row = StoredRow::new(result, &self.tag);

        sqlx::query(INSERT_ROW)
            .bind(&row.id)
            .bind(&row.subdomain)
            .bind(&row.ip)
            .bind(&row.region)
            .bind(&row.service)
            .bind(&row.tag)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Persistence(format!(
                    "failed to insert {} ({}): {}",
                    row.subdomain, row.ip, e
                ))
            })?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        log::debug!("Closed MySQL connection");
    }
}
