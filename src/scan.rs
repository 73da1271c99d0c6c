//! End-to-end scan: load, resolve, classify, render.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::classifier::Classifier;
use crate::error::Result;
use crate::input::read_subdomains;
use crate::pipeline::Pipeline;
use crate::resolver::Resolver;
use crate::sink::{render, OutputMode};
use crate::store::{open_store, DbConfig, ResultStore};
use crate::table::{CidrTable, DEFAULT_CIDR_FILE};

/// Options for a single scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path of the CIDR table JSON file
    pub cidr_path: PathBuf,
    pub mode: OutputMode,
    /// Persistence is used only if this is complete
    pub db: DbConfig,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            cidr_path: PathBuf::from(DEFAULT_CIDR_FILE),
            mode: OutputMode::default(),
            db: DbConfig::default(),
        }
    }
}

/// Counts reported at the end of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSummary {
    /// Non-blank input lines
    pub subdomains: usize,
    /// Records written to the output
    pub matches: usize,
}

/// Run a full scan.
///
/// The CIDR table is loaded and the database (if configured) connected
/// before any input is read; failures there return early and no lookup is
/// ever made. Per-subdomain failures never surface here. The store is
/// closed once every result has been written.
pub async fn scan<R, W>(
    options: &ScanOptions,
    resolver: Arc<dyn Resolver>,
    input: R,
    output: W,
) -> Result<ScanSummary>
where
    R: BufRead,
    W: Write,
{
    let classifier = load_classifier(options)?;
    let store = open_store(&options.db).await?;
    execute(options, classifier, resolver, store, input, output).await
}

/// Run a full scan persisting into `store`, ignoring `options.db`.
///
/// The store is closed when the scan ends, including when rendering fails.
pub async fn scan_with_store<R, W>(
    options: &ScanOptions,
    resolver: Arc<dyn Resolver>,
    store: Arc<dyn ResultStore>,
    input: R,
    output: W,
) -> Result<ScanSummary>
where
    R: BufRead,
    W: Write,
{
    let classifier = load_classifier(options)?;
    execute(options, classifier, resolver, Some(store), input, output).await
}

fn load_classifier(options: &ScanOptions) -> Result<Arc<Classifier>> {
    let table = CidrTable::load(&options.cidr_path)?;
    let classifier = Classifier::new(&table);
    log::info!(
        "Loaded {} CIDR mappings from {}",
        classifier.len(),
        options.cidr_path.display()
    );
    Ok(Arc::new(classifier))
}

async fn execute<R, W>(
    options: &ScanOptions,
    classifier: Arc<Classifier>,
    resolver: Arc<dyn Resolver>,
    store: Option<Arc<dyn ResultStore>>,
    input: R,
    output: W,
) -> Result<ScanSummary>
where
    R: BufRead,
    W: Write,
{
    let outcome =
        resolve_and_render(options, classifier, resolver, store.clone(), input, output).await;

    if let Some(store) = store {
        store.close().await;
    }

    let summary = outcome?;
    log::info!(
        "Matched {} addresses across {} subdomains",
        summary.matches,
        summary.subdomains
    );
    Ok(summary)
}

async fn resolve_and_render<R, W>(
    options: &ScanOptions,
    classifier: Arc<Classifier>,
    resolver: Arc<dyn Resolver>,
    store: Option<Arc<dyn ResultStore>>,
    input: R,
    output: W,
) -> Result<ScanSummary>
where
    R: BufRead,
    W: Write,
{
    let subdomains = read_subdomains(input)?;
    let total = subdomains.len();

    let mut pipeline = Pipeline::new(classifier, resolver);
    pipeline.set_store(store);

    let results = pipeline.run(subdomains);
    let matches = render(results, options.mode, output).await?;

    Ok(ScanSummary {
        subdomains: total,
        matches,
    })
}
