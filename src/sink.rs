//! Rendering of the result stream.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fmt;
use std::io::{self, Write};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::Result;
use crate::pipeline::MatchResult;

/// How results are written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum OutputMode {
    /// One IP address per line
    #[default]
    Plain,
    /// Tab separated subdomain, IP and region
    Table,
    /// Labeled multi-line records
    Verbose,
    /// Pretty-printed JSON array, written once the stream ends
    Json,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Plain => "plain",
            OutputMode::Table => "table",
            OutputMode::Verbose => "verbose",
            OutputMode::Json => "json",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drain `results` until the stream closes, writing each record in `mode`.
///
/// Records are written in arrival order. Returns the number of records.
pub async fn render<W: Write>(
    mut results: UnboundedReceiver<MatchResult>,
    mode: OutputMode,
    mut out: W,
) -> Result<usize> {
    let write_line: fn(&MatchResult, &mut W) -> io::Result<()> = match mode {
        OutputMode::Plain => write_plain,
        OutputMode::Table => write_table,
        OutputMode::Verbose => write_verbose,
        OutputMode::Json => {
            let mut all = Vec::new();
            while let Some(result) = results.recv().await {
                all.push(result);
            }
            write_json(&all, &mut out)?;
            out.flush()?;
            return Ok(all.len());
        }
    };

    let mut count = 0;
    while let Some(result) = results.recv().await {
        write_line(&result, &mut out)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}

fn write_plain<W: Write>(result: &MatchResult, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", result.ip)
}

fn write_table<W: Write>(result: &MatchResult, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}\t{}\t{}", result.subdomain, result.ip, result.region)
}

fn write_verbose<W: Write>(result: &MatchResult, out: &mut W) -> io::Result<()> {
    writeln!(out, "Subdomain: {}", result.subdomain)?;
    writeln!(out, "IP: {}", result.ip)?;
    writeln!(out, "Region: {}", result.region)?;
    writeln!(out, "Service: {}", result.service)?;
    writeln!(out)
}

/// Write results as a JSON array indented by four spaces.
pub fn write_json<W: Write>(results: &[MatchResult], out: &mut W) -> Result<()> {
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut *out, formatter);
    results.serialize(&mut ser).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}
