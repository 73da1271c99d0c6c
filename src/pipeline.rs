//! Concurrent resolve-and-classify pipeline.
//!
//! Every subdomain gets its own task, launched eagerly with no concurrency
//! cap. Lookups run on the runtime's blocking pool, so on a runtime from
//! [`lookup_runtime`](crate::resolver::lookup_runtime) up to
//! [`LOOKUP_THREADS`](crate::resolver::LOOKUP_THREADS) names are resolved at
//! once. Under tokio's default runtime the pool caps this at 512. Very large
//! inputs will also hit host resolver and file descriptor limits.
//!
//! Each task sends its matches on a shared unbounded channel. A coordinator
//! task joins every worker and then drops the last sender, which closes the
//! stream for the consumer. There is no cancellation: once started, every
//! subdomain is resolved to completion.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinSet;

use crate::classifier::Classifier;
use crate::resolver::Resolver;
use crate::store::ResultStore;
use crate::table::CidrMapping;

/// A resolved address of a subdomain that fell inside a known prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub subdomain: String,
    pub ip: String,
    pub region: String,
    pub service: String,
}

impl MatchResult {
    pub fn new(subdomain: &str, ip: IpAddr, mapping: &CidrMapping) -> Self {
        Self {
            subdomain: subdomain.to_string(),
            ip: ip.to_string(),
            region: mapping.region.clone(),
            service: mapping.service.clone(),
        }
    }
}

/// Fans subdomains out to resolver tasks and fans matches back in.
#[derive(Clone)]
pub struct Pipeline {
    classifier: Arc<Classifier>,
    resolver: Arc<dyn Resolver>,
    store: Option<Arc<dyn ResultStore>>,
}

impl Pipeline {
    pub fn new(classifier: Arc<Classifier>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            classifier,
            resolver,
            store: None,
        }
    }

    /// Also hand every match to `store`, inline in the producing task.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set or clear the store.
    pub fn set_store(&mut self, store: Option<Arc<dyn ResultStore>>) {
        self.store = store;
    }

    /// Start one task per subdomain and return the result stream.
    ///
    /// Lines are trimmed and blank lines dropped. The receiver yields
    /// results in arrival order and returns `None` once every task is done.
    /// Must be called from within a Tokio runtime.
    pub fn run<I, S>(&self, subdomains: I) -> UnboundedReceiver<MatchResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for subdomain in subdomains {
            let subdomain = subdomain.as_ref().trim();
            if subdomain.is_empty() {
                continue;
            }

            let worker = self.clone();
            let subdomain = subdomain.to_string();
            let tx = tx.clone();
            tasks.spawn(async move { worker.process(subdomain, tx).await });
        }

        log::debug!("Spawned {} lookup tasks", tasks.len());

        tokio::spawn(async move {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    log::error!("Lookup task failed: {}", e);
                }
            }
            // Last sender goes here; the receiver sees the stream close.
            drop(tx);
        });

        rx
    }

    /// Resolve one subdomain and emit a result for every classified address.
    async fn process(&self, subdomain: String, tx: UnboundedSender<MatchResult>) {
        let addrs = self.resolver.resolve(&subdomain).await;
        if addrs.is_empty() {
            log::debug!("No addresses for {}", subdomain);
            return;
        }

        for ip in addrs {
            let Some(mapping) = self.classifier.classify(ip) else {
                continue;
            };
            let result = MatchResult::new(&subdomain, ip, mapping);

            if let Some(store) = &self.store {
                if let Err(e) = store.insert(&result).await {
                    log::error!("{}", e);
                }
            }

            if tx.send(result).is_err() {
                // Consumer went away; nothing left to deliver to.
                return;
            }
        }
    }
}
