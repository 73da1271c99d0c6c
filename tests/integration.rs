//! End-to-end tests driving a full scan with a stub resolver.

use async_trait::async_trait;
use cidrmap::{
    scan, scan_with_store, DbConfig, Error, MatchResult, MemoryStore, OutputMode, Resolver,
    ScanOptions,
};
use std::collections::HashMap;
use std::io::Write;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Resolver answering from a fixed map and counting every call.
struct StubResolver {
    answers: HashMap<String, Vec<IpAddr>>,
    calls: AtomicUsize,
}

impl StubResolver {
    fn new(answers: &[(&str, &[&str])]) -> Arc<Self> {
        let answers = answers
            .iter()
            .map(|(name, ips)| {
                (
                    name.to_string(),
                    ips.iter().map(|ip| ip.parse().unwrap()).collect::<Vec<IpAddr>>(),
                )
            })
            .collect();
        Arc::new(Self {
            answers,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for StubResolver {
    async fn resolve(&self, name: &str) -> Vec<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers.get(name).cloned().unwrap_or_default()
    }
}

fn cidr_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn options(file: &NamedTempFile, mode: OutputMode) -> ScanOptions {
    ScanOptions {
        cidr_path: file.path().to_path_buf(),
        mode,
        db: DbConfig::default(),
    }
}

const EXAMPLE_TABLE: &str =
    r#"{"cidrs": [{"ip_prefix": "93.184.0.0/16", "region": "us-east", "service": "web"}]}"#;

#[tokio::test]
async fn test_example_scan_json() {
    let file = cidr_file(EXAMPLE_TABLE);
    let resolver = StubResolver::new(&[
        ("a.example.com", &["93.184.216.34"]),
        ("b.example.com", &["8.8.8.8"]),
    ]);

    let mut out = Vec::new();
    let summary = scan(
        &options(&file, OutputMode::Json),
        resolver.clone(),
        "a.example.com\nb.example.com\n".as_bytes(),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(summary.subdomains, 2);
    assert_eq!(summary.matches, 1);
    assert_eq!(resolver.calls(), 2);

    let records: Vec<MatchResult> = serde_json::from_slice(&out).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].subdomain, "a.example.com");
    assert_eq!(records[0].ip, "93.184.216.34");
    assert_eq!(records[0].region, "us-east");
    assert_eq!(records[0].service, "web");
    assert!(records.iter().all(|r| r.subdomain != "b.example.com"));
}

#[tokio::test]
async fn test_example_scan_table() {
    let file = cidr_file(EXAMPLE_TABLE);
    let resolver = StubResolver::new(&[
        ("a.example.com", &["93.184.216.34"]),
        ("b.example.com", &["8.8.8.8"]),
    ]);

    let mut out = Vec::new();
    scan(
        &options(&file, OutputMode::Table),
        resolver,
        "\n  a.example.com \n\nb.example.com".as_bytes(),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "a.example.com\t93.184.216.34\tus-east\n"
    );
}

#[tokio::test]
async fn test_malformed_table_stops_before_resolution() {
    let file = cidr_file("{\"cidrs\": [ not json");
    let resolver = StubResolver::new(&[("a.example.com", &["93.184.216.34"])]);

    let mut out = Vec::new();
    let result = scan(
        &options(&file, OutputMode::Plain),
        resolver.clone(),
        "a.example.com\n".as_bytes(),
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(Error::Parse(_))));
    assert_eq!(resolver.calls(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_missing_table_stops_before_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let opts = ScanOptions {
        cidr_path: dir.path().join("cidr_mappings.json"),
        ..ScanOptions::default()
    };
    let resolver = StubResolver::new(&[]);

    let result = scan(&opts, resolver.clone(), "a.example.com\n".as_bytes(), Vec::new()).await;

    assert!(matches!(result, Err(Error::Config { .. })));
    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_order_sensitive_overlap() {
    let file = cidr_file(
        r#"{"cidrs": [
            {"ip_prefix": "10.0.0.0/8", "region": "wide", "service": "a"},
            {"ip_prefix": "10.1.0.0/16", "region": "narrow", "service": "b"}
        ]}"#,
    );
    let resolver = StubResolver::new(&[("host.example.com", &["10.1.2.3"])]);

    let mut out = Vec::new();
    scan(
        &options(&file, OutputMode::Verbose),
        resolver,
        "host.example.com".as_bytes(),
        &mut out,
    )
    .await
    .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Subdomain: host.example.com\nIP: 10.1.2.3\nRegion: wide\nService: a\n\n"
    );
}

#[tokio::test]
async fn test_partial_db_config_runs_without_persistence() {
    let file = cidr_file(EXAMPLE_TABLE);
    let resolver = StubResolver::new(&[("a.example.com", &["93.184.216.34"])]);
    let opts = ScanOptions {
        db: DbConfig {
            username: "user".into(),
            password: "secret".into(),
            host: "db.invalid".into(),
            database: "recon".into(),
            tag: String::new(),
            ..DbConfig::default()
        },
        ..options(&file, OutputMode::Plain)
    };

    let mut out = Vec::new();
    let summary = scan(&opts, resolver, "a.example.com".as_bytes(), &mut out)
        .await
        .unwrap();

    assert_eq!(summary.matches, 1);
    assert_eq!(String::from_utf8(out).unwrap(), "93.184.216.34\n");
}

#[tokio::test]
async fn test_duplicate_lines_each_resolved() {
    let file = cidr_file(EXAMPLE_TABLE);
    let resolver = StubResolver::new(&[("a.example.com", &["93.184.216.34"])]);

    let summary = scan(
        &options(&file, OutputMode::Plain),
        resolver.clone(),
        "a.example.com\na.example.com\n".as_bytes(),
        Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(resolver.calls(), 2);
    assert_eq!(summary.matches, 2);
}

#[tokio::test]
async fn test_store_written_then_closed() {
    let file = cidr_file(EXAMPLE_TABLE);
    let resolver = StubResolver::new(&[
        ("a.example.com", &["93.184.216.34", "93.184.216.35"]),
        ("b.example.com", &["8.8.8.8"]),
    ]);
    let store = Arc::new(MemoryStore::new("run-1"));

    let summary = scan_with_store(
        &options(&file, OutputMode::Plain),
        resolver,
        store.clone(),
        "a.example.com\nb.example.com\n".as_bytes(),
        Vec::new(),
    )
    .await
    .unwrap();

    assert_eq!(summary.matches, 2);
    assert_eq!(store.len(), 2);
    assert!(store.rows().iter().all(|row| row.tag == "run-1"));
    assert!(store.is_closed());
}

#[tokio::test]
async fn test_store_closed_when_output_fails() {
    struct BrokenOutput;

    impl Write for BrokenOutput {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let file = cidr_file(EXAMPLE_TABLE);
    let resolver = StubResolver::new(&[("a.example.com", &["93.184.216.34"])]);
    let store = Arc::new(MemoryStore::new("run-1"));

    let result = scan_with_store(
        &options(&file, OutputMode::Plain),
        resolver,
        store.clone(),
        "a.example.com".as_bytes(),
        BrokenOutput,
    )
    .await;

    assert!(matches!(result, Err(Error::Io(_))));
    assert!(store.is_closed());
}

#[tokio::test]
async fn test_empty_table_scans_without_matches() {
    for contents in ["{}", r#"{"cidrs": null}"#] {
        let file = cidr_file(contents);
        let resolver = StubResolver::new(&[("a.example.com", &["93.184.216.34"])]);

        let mut out = Vec::new();
        let summary = scan(
            &options(&file, OutputMode::Json),
            resolver.clone(),
            "a.example.com\n".as_bytes(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(resolver.calls(), 1);
        assert_eq!(summary.matches, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "[]\n");
    }
}
