//! Subdomain list input.

use std::io::{self, BufRead};

/// Read one subdomain per line.
///
/// Lines are trimmed and blank lines dropped; order and duplicates are kept.
pub fn read_subdomains<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut subdomains = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            subdomains.push(line.to_string());
        }
    }
    Ok(subdomains)
}
