//! Optional persistence of match results.
//!
//! Persistence is enabled only when every [`DbConfig`] field is set. A
//! partial configuration silently disables it rather than failing the run.

mod mysql;

pub use mysql::MySqlStore;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::MatchResult;

/// Default MySQL port.
pub const DEFAULT_DB_PORT: u16 = 3306;

/// Database connection parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Value written to the `tag` column of every row
    pub tag: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: String::new(),
            port: DEFAULT_DB_PORT,
            database: String::new(),
            tag: String::new(),
        }
    }
}

impl DbConfig {
    /// True when every field is set; any empty field disables persistence.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty()
            && !self.password.is_empty()
            && !self.host.is_empty()
            && self.port != 0
            && !self.database.is_empty()
            && !self.tag.is_empty()
    }
}

/// Derive the row identifier for a result.
///
/// This is the base64 encoding of `ip` followed by `subdomain`. It is
/// reversible for a known split point but the concatenation itself is
/// ambiguous: `("1.2.3.4", "x.com")` and `("1.2.3.4x", ".com")` share an id.
/// Real addresses never end in a letter, so collisions need a malformed ip.
pub fn record_id(ip: &str, subdomain: &str) -> String {
    STANDARD.encode(format!("{ip}{subdomain}"))
}

/// One row as written to the `subdomains` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRow {
    pub id: String,
    pub subdomain: String,
    pub ip: String,
    pub region: String,
    pub service: String,
    pub tag: String,
}

impl StoredRow {
    pub fn new(result: &MatchResult, tag: &str) -> Self {
        Self {
            id: record_id(&result.ip, &result.subdomain),
            subdomain: result.subdomain.clone(),
            ip: result.ip.clone(),
            region: result.region.clone(),
            service: result.service.clone(),
            tag: tag.to_string(),
        }
    }
}

/// Sink for individual match results, shared by all pipeline tasks.
///
/// Implementations must tolerate concurrent calls.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Persist a single result.
    async fn insert(&self, result: &MatchResult) -> Result<()>;

    /// Release connections once no more inserts will be made.
    async fn close(&self) {}
}

/// Open the configured store.
///
/// Returns `Ok(None)` without touching the network when the configuration
/// is incomplete, and [`Error::Connection`] when a complete configuration
/// points at an unreachable server.
pub async fn open_store(config: &DbConfig) -> Result<Option<Arc<dyn ResultStore>>> {
    if !config.is_complete() {
        log::debug!("Database configuration incomplete, persistence disabled");
        return Ok(None);
    }

    let store = MySqlStore::connect(config).await?;
    Ok(Some(Arc::new(store)))
}

/// In-process store that keeps rows in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tag: String,
    rows: Mutex<Vec<StoredRow>>,
    fail: bool,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            rows: Mutex::new(Vec::new()),
            fail: false,
            closed: AtomicBool::new(false),
        }
    }

    /// A store that rejects every insert.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of the rows written so far.
    pub fn rows(&self) -> Vec<StoredRow> {
        self.rows.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert(&self, result: &MatchResult) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Persistence("store is closed".to_string()));
        }
        if self.fail {
            return Err(Error::Persistence(format!(
                "insert rejected for {} ({})",
                result.subdomain, result.ip
            )));
        }
        self.rows.lock().push(StoredRow::new(result, &self.tag));
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
