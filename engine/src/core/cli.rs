use clap::{Args, Parser, Subcommand};

use std::fmt;
use std::path::PathBuf;

use crate::data::QueryLanguage;

use super::constants::{
    ENV_ADDRESS, ENV_BUCKET, ENV_CONFIG, ENV_LANGUAGE, ENV_MAX_ROWS, ENV_ORG_ID,
    ENV_OUTPUT_FORMAT, ENV_TIMEOUT_SECS, ENV_TOKEN,
};

#[derive(Parser)]
#[command(name = "querypad")]
#[command(version, about = "Run SQL, InfluxQL and Flux queries against InfluxDB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Server base URL, e.g. http://localhost:8086
    #[arg(long, short = 'a', global = true, env = ENV_ADDRESS)]
    pub address: Option<String>,

    /// API token
    #[arg(long, global = true, env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// Bucket (v2) or database (v3)
    #[arg(long, short = 'b', global = true, env = ENV_BUCKET)]
    pub bucket: Option<String>,

    /// Organization id (Flux queries)
    #[arg(long, global = true, env = ENV_ORG_ID)]
    pub org_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub timeout: Option<u64>,

    /// Query language (sql, influxql, flux)
    #[arg(long, short = 'l', global = true, env = ENV_LANGUAGE, value_parser = parse_language)]
    pub language: Option<QueryLanguage>,

    /// Output format (csv, weirdcsv, lineprotocol)
    #[arg(long, short = 'f', global = true, env = ENV_OUTPUT_FORMAT)]
    pub format: Option<String>,

    /// Maximum rows to return (0 = unlimited)
    #[arg(long, short = 'n', global = true, env = ENV_MAX_ROWS, allow_negative_numbers = true)]
    pub max_rows: Option<i64>,
}

/// Parse query language from CLI/env string
fn parse_language(s: &str) -> Result<QueryLanguage, String> {
    s.parse()
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Execute a query and print the result
    Run {
        #[command(flatten)]
        source: QuerySource,
    },
    /// Print the parameters declared in a query and the query sent to the server
    Params {
        #[command(flatten)]
        source: QuerySource,
    },
}

/// Where the query text comes from; stdin when neither is given
#[derive(Args, Clone, Debug, Default)]
pub struct QuerySource {
    /// Read the query from a file
    #[arg(long, short = 'i', conflicts_with = "query")]
    pub file: Option<PathBuf>,

    /// Query text
    #[arg(long, short = 'q')]
    pub query: Option<String>,
}

/// Configuration derived from CLI arguments
#[derive(Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub address: Option<String>,
    pub token: Option<String>,
    pub bucket: Option<String>,
    pub org_id: Option<String>,
    pub timeout_secs: Option<u64>,
    pub language: Option<QueryLanguage>,
    pub output_format: Option<String>,
    pub max_rows: Option<i64>,
}

impl fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliConfig")
            .field("config", &self.config)
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("bucket", &self.bucket)
            .field("org_id", &self.org_id)
            .field("timeout_secs", &self.timeout_secs)
            .field("language", &self.language)
            .field("output_format", &self.output_format)
            .field("max_rows", &self.max_rows)
            .finish()
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        address: cli.address,
        token: cli.token,
        bucket: cli.bucket,
        org_id: cli.org_id,
        timeout_secs: cli.timeout,
        language: cli.language,
        output_format: cli.format,
        max_rows: cli.max_rows,
    };
    (config, cli.command)
}
