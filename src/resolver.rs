//! Host name resolution.
//!
//! [`SystemResolver`] runs each `getaddrinfo` call on the runtime's blocking
//! pool, so the pool size bounds how many lookups are in flight. Tokio's
//! default of 512 threads would queue the rest; [`lookup_runtime`] builds a
//! runtime whose pool is large enough that every subdomain gets a thread.

use ahash::AHashSet;
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use tokio::runtime::{Builder, Runtime};

/// Blocking pool size of [`lookup_runtime`].
pub const LOOKUP_THREADS: usize = 16_384;

/// Build a multi-threaded runtime whose blocking pool holds
/// [`LOOKUP_THREADS`] concurrent lookups.
pub fn lookup_runtime() -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(LOOKUP_THREADS)
        .thread_name("cidrmap")
        .build()
}

/// Resolver turns a domain name into the addresses it points at.
///
/// Implementations never fail: any lookup error is reported as an empty
/// address list, and the caller skips the name.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a trimmed, non-empty domain name.
    async fn resolve(&self, name: &str) -> Vec<IpAddr>;
}

/// Resolver backed by the host's own name resolution (`getaddrinfo`).
///
/// No timeout or retry is applied beyond what the host resolver does.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Resolver for SystemResolver {
    async fn resolve(&self, name: &str) -> Vec<IpAddr> {
        // Port is required by the socket address API and otherwise unused
        let query = format!("{name}:0");
        match tokio::net::lookup_host(query).await {
            Ok(addrs) => dedup_in_order(addrs.map(|a| a.ip())),
            Err(e) => {
                log::debug!("Lookup failed for {}: {}", name, e);
                Vec::new()
            }
        }
    }
}

/// Drop repeated addresses, keeping the first occurrence of each.
pub(crate) fn dedup_in_order(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut seen = AHashSet::new();
    addrs.into_iter().filter(|ip| seen.insert(*ip)).collect()
}
