//! First-match CIDR classification.

use ipnet::IpNet;
use std::net::IpAddr;

use crate::error::CidrParseError;
use crate::table::{CidrMapping, CidrTable};

/// A table entry with its prefix parsed ahead of time.
#[derive(Debug, Clone)]
pub struct CidrEntry {
    mapping: CidrMapping,
    /// `None` when the prefix is not valid CIDR notation
    network: Option<IpNet>,
}

impl CidrEntry {
    /// Parse the prefix of a mapping. Invalid prefixes still produce an
    /// entry, which never matches.
    pub fn new(mapping: CidrMapping) -> Self {
        let network = parse_prefix(&mapping.ip_prefix).ok();
        Self { mapping, network }
    }

    pub fn mapping(&self) -> &CidrMapping {
        &self.mapping
    }

    pub fn network(&self) -> Option<IpNet> {
        self.network
    }

    /// Check whether the address falls inside this entry's network.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are checked as the
    /// IPv4 address they carry. Otherwise families must agree: an IPv4
    /// address never matches an IPv6 prefix and vice versa.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match self.network {
            Some(net) => net.contains(&ip.to_canonical()),
            None => false,
        }
    }
}

/// Parse a CIDR prefix. Host bits past the mask are allowed and ignored.
pub fn parse_prefix(prefix: &str) -> Result<IpNet, CidrParseError> {
    let prefix = prefix.trim();
    prefix
        .parse::<IpNet>()
        .map_err(|_| CidrParseError::InvalidCidr(prefix.to_string()))
}

/// Classifier matches addresses against a CIDR table in table order.
///
/// The first entry whose network contains the address wins, even when a
/// later entry has a longer, more specific prefix.
///
/// # Examples
/// ```
/// use cidrmap::{CidrMapping, CidrTable, Classifier};
///
/// let table = CidrTable::new(vec![
///     CidrMapping::new("10.0.0.0/8", "wide", "a"),
///     CidrMapping::new("10.1.0.0/16", "narrow", "b"),
/// ]);
/// let classifier = Classifier::new(&table);
///
/// let hit = classifier.classify("10.1.2.3".parse().unwrap()).unwrap();
/// assert_eq!(hit.region, "wide");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    entries: Vec<CidrEntry>,
    skipped: usize,
}

impl Classifier {
    /// Pre-parse every prefix of the table, keeping table order.
    pub fn new(table: &CidrTable) -> Self {
        let entries: Vec<CidrEntry> = table
            .mappings()
            .iter()
            .cloned()
            .map(CidrEntry::new)
            .collect();
        let skipped = entries.iter().filter(|e| e.network.is_none()).count();

        if skipped > 0 {
            log::warn!(
                "Skipping {} of {} CIDR entries with invalid prefixes",
                skipped,
                entries.len()
            );
        }

        Self { entries, skipped }
    }

    /// Return the first mapping whose prefix contains `ip`.
    pub fn classify(&self, ip: IpAddr) -> Option<&CidrMapping> {
        self.entries
            .iter()
            .find(|entry| entry.contains(&ip))
            .map(CidrEntry::mapping)
    }

    /// Entries in table order, including unparseable ones.
    pub fn entries(&self) -> &[CidrEntry] {
        &self.entries
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose prefix failed to parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl From<&CidrTable> for Classifier {
    fn from(table: &CidrTable) -> Self {
        Self::new(table)
    }
}
