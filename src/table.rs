//! CIDR table loading.
//!
//! The table is a JSON document of the form
//! `{"cidrs": [{"ip_prefix": ..., "region": ..., "service": ..., "network_border_group": ...}]}`.
//! Entry order is significant: it decides which prefix wins when several
//! contain the same address.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// Default table file name, relative to the working directory.
pub const DEFAULT_CIDR_FILE: &str = "cidr_mappings.json";

/// A single CIDR prefix and the owner it maps to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidrMapping {
    /// Network prefix in CIDR notation, e.g. `52.94.0.0/22`
    #[serde(default)]
    pub ip_prefix: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub network_border_group: String,
}

impl CidrMapping {
    /// Create a mapping with an empty network border group.
    pub fn new(
        ip_prefix: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            ip_prefix: ip_prefix.into(),
            region: region.into(),
            service: service.into(),
            network_border_group: String::new(),
        }
    }
}

/// Ordered set of CIDR mappings, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidrTable {
    /// A missing or `null` list is an empty table
    #[serde(default, deserialize_with = "null_as_empty")]
    cidrs: Vec<CidrMapping>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<CidrMapping>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CidrMapping>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CidrTable {
    /// Create a table from mappings, keeping their order.
    pub fn new(cidrs: Vec<CidrMapping>) -> Self {
        Self { cidrs }
    }

    /// Parse a table from a JSON string.
    ///
    /// A document of `null` parses to an empty table.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: Option<Self> = serde_json::from_str(json)?;
        Ok(table.unwrap_or_default())
    }

    /// Parse a table from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let table: Option<Self> = serde_json::from_reader(BufReader::new(reader))?;
        Ok(table.unwrap_or_default())
    }

    /// Load a table from a file.
    ///
    /// Fails with [`Error::Config`] if the file cannot be opened and with
    /// [`Error::Parse`] if its contents are malformed. No partial table is
    /// ever returned.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })?;

        let table = Self::from_reader(file).map_err(|e| match e {
            Error::Parse(e) if e.is_io() => Error::Config {
                path: path.to_path_buf(),
                source: e.into(),
            },
            e => e,
        })?;

        log::debug!("Loaded {} CIDR mappings from {}", table.len(), path.display());
        Ok(table)
    }

    /// Mappings in table order.
    pub fn mappings(&self) -> &[CidrMapping] {
        &self.cidrs
    }

    pub fn len(&self) -> usize {
        self.cidrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cidrs.is_empty()
    }
}
