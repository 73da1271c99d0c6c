//! cidrmap: resolve subdomains from stdin and report which CIDR owns each address.

use clap::Parser;
use cidrmap::store::DEFAULT_DB_PORT;
use cidrmap::resolver::lookup_runtime;
use cidrmap::{scan, DbConfig, OutputMode, ScanOptions, SystemResolver, DEFAULT_CIDR_FILE};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "cidrmap")]
#[command(version)]
#[command(about = "Resolve subdomains from stdin and classify their IPs by CIDR range", long_about = None)]
struct Cli {
    /// Path to the CIDR mapping file
    #[arg(short, long = "cidrs", env = "CIDRMAP_CIDRS", default_value = DEFAULT_CIDR_FILE)]
    cidr_file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputMode::Plain)]
    output: OutputMode,

    /// Output subdomain, IP, region and service (same as --output verbose)
    #[arg(short, long)]
    verbose: bool,

    /// Output in JSON format (same as --output json)
    #[arg(long)]
    json: bool,

    /// Database user
    #[arg(long, env = "CIDRMAP_DB_USER", default_value = "")]
    db_user: String,

    /// Database password
    #[arg(long, env = "CIDRMAP_DB_PASSWORD", default_value = "", hide_env_values = true)]
    db_password: String,

    /// Database host
    #[arg(long, env = "CIDRMAP_DB_HOST", default_value = "")]
    db_host: String,

    /// Database port
    #[arg(long, env = "CIDRMAP_DB_PORT", default_value_t = DEFAULT_DB_PORT)]
    db_port: u16,

    /// Database name
    #[arg(long, env = "CIDRMAP_DB_NAME", default_value = "")]
    db_name: String,

    /// Tag stored with every row
    #[arg(long, env = "CIDRMAP_DB_TAG", default_value = "")]
    db_tag: String,
}

impl Cli {
    fn mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.verbose {
            OutputMode::Verbose
        } else {
            self.output
        }
    }

    fn into_options(self) -> ScanOptions {
        let mode = self.mode();
        ScanOptions {
            cidr_path: self.cidr_file,
            mode,
            db: DbConfig {
                username: self.db_user,
                password: self.db_password,
                host: self.db_host,
                port: self.db_port,
                database: self.db_name,
                tag: self.db_tag,
            },
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let options = Cli::parse().into_options();

    let runtime = match lookup_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: cannot start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();

    let outcome = runtime.block_on(scan(&options, Arc::new(SystemResolver::new()), stdin, stdout));
    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
