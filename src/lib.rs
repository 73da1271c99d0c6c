//! cidrmap - Resolve subdomains and find out who owns their addresses.
//!
//! This crate resolves a list of subdomains through the host resolver and
//! classifies every resolved address against an ordered table of CIDR
//! ranges, typically a cloud provider's published IP ranges.
//!
//! # Features
//!
//! - **Concurrent lookups**: one task per subdomain, results fanned in on a
//!   single stream
//! - **First-match classification**: table order decides which prefix wins
//! - **IPv4 and IPv6**: families never cross-match, except that IPv4-mapped
//!   IPv6 addresses are classified as IPv4
//! - **Output modes**: plain IPs, tab separated, verbose records, or JSON
//! - **MySQL persistence**: optional, enabled only by a complete config
//!
//! # Quick Start
//!
//! ```no_run
//! use cidrmap::{CidrTable, Classifier, OutputMode, Pipeline, SystemResolver};
//! use std::sync::Arc;
//!
//! # async fn run() -> cidrmap::Result<()> {
//! let table = CidrTable::load("cidr_mappings.json")?;
//! let pipeline = Pipeline::new(Arc::new(Classifier::new(&table)), Arc::new(SystemResolver));
//!
//! let results = pipeline.run(["www.example.com", "api.example.com"]);
//! cidrmap::render(results, OutputMode::Table, std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Matching Priority
//!
//! Entries are tried in the order they appear in the table and the first
//! containing prefix wins. This is not longest-prefix matching: put more
//! specific prefixes first if they should take precedence.

mod error;

pub mod classifier;
pub mod input;
pub mod pipeline;
pub mod resolver;
pub mod scan;
pub mod sink;
pub mod store;
pub mod table;

// Re-export core types
pub use error::{CidrParseError, Error, Result};

pub use classifier::{CidrEntry, Classifier};
pub use input::read_subdomains;
pub use pipeline::{MatchResult, Pipeline};
pub use resolver::{lookup_runtime, Resolver, SystemResolver};
pub use scan::{scan, scan_with_store, ScanOptions, ScanSummary};
pub use sink::{render, OutputMode};
pub use store::{open_store, record_id, DbConfig, MemoryStore, MySqlStore, ResultStore};
pub use table::{CidrMapping, CidrTable, DEFAULT_CIDR_FILE};
