use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::{QueryLanguage, ServerDetails};
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_MAX_ROWS, DEFAULT_OUTPUT_FORMAT,
    DEFAULT_TIMEOUT_SECS,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server connection section
#[derive(Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub address: Option<String>,
    pub token: Option<String>,
    pub bucket: Option<String>,
    pub org_id: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for ServerFileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerFileConfig")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("bucket", &self.bucket)
            .field("org_id", &self.org_id)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Query defaults section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub language: Option<QueryLanguage>,
    pub output_format: Option<String>,
    pub max_rows: Option<i64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub query: Option<QueryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.address.is_some() {
                tracing::trace!(address = ?server.address, "Merging server.address");
                current.address = server.address;
            }
            if server.token.is_some() {
                tracing::trace!("Merging server.token");
                current.token = server.token;
            }
            if server.bucket.is_some() {
                tracing::trace!(bucket = ?server.bucket, "Merging server.bucket");
                current.bucket = server.bucket;
            }
            if server.org_id.is_some() {
                tracing::trace!(org_id = ?server.org_id, "Merging server.org_id");
                current.org_id = server.org_id;
            }
            if server.timeout_secs.is_some() {
                tracing::trace!(timeout_secs = ?server.timeout_secs, "Merging server.timeout_secs");
                current.timeout_secs = server.timeout_secs;
            }
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.language.is_some() {
                tracing::trace!(language = ?query.language, "Merging query.language");
                current.language = query.language;
            }
            if query.output_format.is_some() {
                tracing::trace!(output_format = ?query.output_format, "Merging query.output_format");
                current.output_format = query.output_format;
            }
            if query.max_rows.is_some() {
                tracing::trace!(max_rows = ?query.max_rows, "Merging query.max_rows");
                current.max_rows = query.max_rows;
            }
        }
    }
}

// =============================================================================
// Resolved Config Structs
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `None` when no address is configured
    pub details: Option<ServerDetails>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub language: QueryLanguage,
    /// Passed through as written; unknown names are reported by the dispatcher
    pub output_format: String,
    /// Zero or less is unlimited
    pub max_rows: i64,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub query: QueryConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.querypad/querypad.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.querypad/querypad.json) - skip if not exists
        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        // 3. Extract file config values with defaults
        let file_server = file_config.server.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();

        // 4. Layer configs: defaults -> file config -> CLI/env overrides
        let address = cli
            .address
            .clone()
            .or(file_server.address)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        let details = address.map(|address| {
            ServerDetails::new(
                address,
                cli.token.clone().or(file_server.token).unwrap_or_default(),
                cli.bucket.clone().or(file_server.bucket).unwrap_or_default(),
                cli.org_id.clone().or(file_server.org_id).unwrap_or_default(),
            )
        });

        let server = ServerConfig {
            details,
            timeout_secs: cli
                .timeout_secs
                .or(file_server.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let query = QueryConfig {
            language: cli.language.or(file_query.language).unwrap_or_default(),
            output_format: cli
                .output_format
                .clone()
                .or(file_query.output_format)
                .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string()),
            max_rows: cli
                .max_rows
                .or(file_query.max_rows)
                .unwrap_or(DEFAULT_MAX_ROWS),
        };

        let config = Self { server, query };
        config.validate()?;

        tracing::debug!(
            address = config.server.details.as_ref().map(|d| d.address.as_str()),
            language = %config.query.language,
            output_format = %config.query.output_format,
            max_rows = config.query.max_rows,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(ref details) = self.server.details
            && !(details.address.starts_with("http://") || details.address.starts_with("https://"))
        {
            anyhow::bail!(
                "Configuration error: server.address must start with http:// or https:// (got '{}')",
                details.address
            );
        }

        if self.server.timeout_secs == 0 {
            anyhow::bail!("Configuration error: server.timeout_secs must be greater than 0");
        }

        if self.query.output_format.trim().is_empty() {
            anyhow::bail!("Configuration error: query.output_format must not be empty");
        }

        Ok(())
    }
}

/// Get the profile config path (~/.querypad/querypad.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": {
                "address": "http://localhost:8086",
                "token": "t0ken",
                "bucket": "sensors",
                "org_id": "0123",
                "timeout_secs": 5
            },
            "query": { "language": "flux", "output_format": "weirdcsv", "max_rows": 50 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.address.as_deref(), Some("http://localhost:8086"));
        assert_eq!(server.org_id.as_deref(), Some("0123"));
        assert_eq!(server.timeout_secs, Some(5));
        let query = config.query.as_ref().unwrap();
        assert_eq!(query.language, Some(QueryLanguage::Flux));
        assert_eq!(query.output_format.as_deref(), Some("weirdcsv"));
        assert_eq!(query.max_rows, Some(50));
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.server.is_none());
        assert!(config.query.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "query": { "max_rows": 10 }, "unknown_field": "value" }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.query.as_ref().unwrap().max_rows, Some(10));
        match &config.extra {
            serde_json::Value::Object(map) => assert!(map.contains_key("unknown_field")),
            other => panic!("unexpected extra: {:?}", other),
        }
    }

    #[test]
    fn test_file_config_rejects_unknown_language() {
        let json = r#"{ "query": { "language": "promql" } }"#;
        assert!(serde_json::from_str::<FileConfig>(json).is_err());
    }

    #[test]
    fn test_server_file_config_debug_redacts_token() {
        let server = ServerFileConfig {
            token: Some("t0ken".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", server).contains("t0ken"));
    }

    #[test]
    fn test_file_config_merge() {
        let mut base = FileConfig {
            server: Some(ServerFileConfig {
                address: Some("http://base:8086".to_string()),
                token: Some("base-token".to_string()),
                bucket: Some("base".to_string()),
                org_id: None,
                timeout_secs: Some(10),
            }),
            query: Some(QueryFileConfig {
                language: Some(QueryLanguage::Sql),
                output_format: Some("csv".to_string()),
                max_rows: None,
            }),
            extra: serde_json::Value::Null,
        };

        let overlay = FileConfig {
            server: Some(ServerFileConfig {
                address: None,
                token: Some("overlay-token".to_string()),
                bucket: None,
                org_id: Some("org".to_string()),
                timeout_secs: None,
            }),
            query: Some(QueryFileConfig {
                language: Some(QueryLanguage::InfluxQl),
                output_format: None,
                max_rows: Some(25),
            }),
            extra: serde_json::Value::Null,
        };

        base.merge(overlay);

        let server = base.server.as_ref().unwrap();
        assert_eq!(server.address.as_deref(), Some("http://base:8086"));
        assert_eq!(server.token.as_deref(), Some("overlay-token"));
        assert_eq!(server.bucket.as_deref(), Some("base"));
        assert_eq!(server.org_id.as_deref(), Some("org"));
        assert_eq!(server.timeout_secs, Some(10));

        let query = base.query.as_ref().unwrap();
        assert_eq!(query.language, Some(QueryLanguage::InfluxQl));
        assert_eq!(query.output_format.as_deref(), Some("csv"));
        assert_eq!(query.max_rows, Some(25));
    }

    #[test]
    fn test_app_config_defaults() {
        let cli = CliConfig::default();
        let config = AppConfig::load(&cli).unwrap();

        assert!(config.server.details.is_none());
        assert_eq!(config.server.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.query.language, QueryLanguage::Sql);
        assert_eq!(config.query.output_format, DEFAULT_OUTPUT_FORMAT);
        assert_eq!(config.query.max_rows, DEFAULT_MAX_ROWS);
    }

    #[test]
    fn test_app_config_from_file() {
        let file = write_config(
            r#"{
                "server": { "address": " https://cloud.example.com ", "token": "t", "bucket": "b" },
                "query": { "language": "influxql", "max_rows": 0 }
            }"#,
        );
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();

        let details = config.server.details.unwrap();
        assert_eq!(details.address, "https://cloud.example.com");
        assert_eq!(details.token, "t");
        assert_eq!(details.bucket, "b");
        assert_eq!(details.org_id, "");
        assert_eq!(config.query.language, QueryLanguage::InfluxQl);
        assert_eq!(config.query.max_rows, 0);
    }

    #[test]
    fn test_app_config_cli_override() {
        let file = write_config(
            r#"{
                "server": { "address": "http://file:8086", "bucket": "file-bucket" },
                "query": { "output_format": "csv", "max_rows": 10 }
            }"#,
        );
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            address: Some("http://cli:8181".to_string()),
            language: Some(QueryLanguage::Flux),
            output_format: Some("lineprotocol".to_string()),
            max_rows: Some(-1),
            timeout_secs: Some(3),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();

        let details = config.server.details.unwrap();
        assert_eq!(details.address, "http://cli:8181");
        assert_eq!(details.bucket, "file-bucket");
        assert_eq!(config.server.timeout_secs, 3);
        assert_eq!(config.query.language, QueryLanguage::Flux);
        assert_eq!(config.query.output_format, "lineprotocol");
        assert_eq!(config.query.max_rows, -1);
    }

    #[test]
    fn test_app_config_missing_file() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/querypad.json")),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_app_config_invalid_json() {
        let file = write_config("{ not json");
        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_app_config_validation_address_scheme() {
        let cli = CliConfig {
            address: Some("localhost:8086".to_string()),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("server.address"));
    }

    #[test]
    fn test_app_config_validation_timeout_zero() {
        let cli = CliConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("server.timeout_secs"));
    }

    #[test]
    fn test_app_config_blank_address_means_no_server() {
        let cli = CliConfig {
            address: Some("   ".to_string()),
            ..Default::default()
        };
        let config = AppConfig::load(&cli).unwrap();
        assert!(config.server.details.is_none());
    }
}
