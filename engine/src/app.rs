//! Core application

use std::io::{IsTerminal, Read};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::core::cli::{self, CliConfig, Commands, QuerySource};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::data::HttpClientFactory;
use crate::domain::dispatch;
use crate::domain::query::{extract_query, locate_parameters, position_at};
use crate::utils::file::read_text;

pub struct CoreApp {
    pub config: AppConfig,
    pub factory: HttpClientFactory,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Commands::Params { source } => {
                let query = read_query(&source)?;
                print!("{}", describe_parameters(&query));
                Ok(())
            }
            Commands::Run { source } => {
                let app = Self::init(&cli_config)?;
                let query = read_query(&source)?;
                let output = app.execute(&query).await;
                println!("{}", output);
                Ok(())
            }
        }
    }

    fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let factory = HttpClientFactory::new(Duration::from_secs(config.server.timeout_secs))
            .context("Failed to create HTTP client")?;
        Ok(Self { config, factory })
    }

    /// Run one query with the configured server and query defaults
    pub async fn execute(&self, raw_query: &str) -> String {
        let details = self.config.server.details.as_ref();
        if let Some(server) = details {
            tracing::info!(address = %server.address, "Executing query");
        }
        dispatch::execute(
            details,
            raw_query,
            self.config.query.language,
            &self.factory,
            &self.config.query.output_format,
            self.config.query.max_rows,
        )
        .await
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(std::io::stderr().is_terminal())
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

/// Query text from `--file`, `--query`, or stdin
fn read_query(source: &QuerySource) -> Result<String> {
    if let Some(ref path) = source.file {
        return read_text(path);
    }
    if let Some(ref query) = source.query {
        return Ok(query.clone());
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!(
            "No query given. Pass --query, --file, or pipe the query into {}",
            APP_NAME_LOWER
        );
    }
    let mut query = String::new();
    stdin
        .read_to_string(&mut query)
        .context("Failed to read query from stdin")?;
    Ok(query)
}

/// One `name:type = value` line per declaration, where each name sits in
/// the source (1-based `line:column`), then the cleaned query
fn describe_parameters(raw_query: &str) -> String {
    let extracted = extract_query(raw_query);
    let mut out = String::new();

    if extracted.parameters.is_empty() {
        out.push_str("# no parameters\n");
    } else {
        out.push_str("# parameters\n");
        for parameter in &extracted.parameters {
            out.push_str(&format!("{}\n", parameter));
        }
    }

    let spans = locate_parameters(raw_query);
    if !spans.is_empty() {
        out.push_str("# locations\n");
        for span in &spans {
            let (line, column) = position_at(raw_query, span.name_range.start);
            out.push_str(&format!("{} {}:{}\n", span.name, line + 1, column + 1));
        }
    }

    out.push_str("# query\n");
    out.push_str(&extracted.query_text);
    if !extracted.query_text.ends_with('\n') {
        out.push('\n');
    }
    out
}
