// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "querypad";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".querypad";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "querypad.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "QUERYPAD_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "QUERYPAD_LOG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for the server base URL
pub const ENV_ADDRESS: &str = "QUERYPAD_ADDRESS";

/// Environment variable for the API token
pub const ENV_TOKEN: &str = "QUERYPAD_TOKEN";

/// Environment variable for the bucket (v2) or database (v3)
pub const ENV_BUCKET: &str = "QUERYPAD_BUCKET";

/// Environment variable for the organization id (Flux only)
pub const ENV_ORG_ID: &str = "QUERYPAD_ORG_ID";

/// Environment variable for the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "QUERYPAD_TIMEOUT_SECS";

// =============================================================================
// Environment Variables - Query
// =============================================================================

/// Environment variable for the query language (sql, influxql, flux)
pub const ENV_LANGUAGE: &str = "QUERYPAD_LANGUAGE";

/// Environment variable for the output format (csv, weirdcsv, lineprotocol)
pub const ENV_OUTPUT_FORMAT: &str = "QUERYPAD_OUTPUT_FORMAT";

/// Environment variable for the row limit (0 or less = unlimited)
pub const ENV_MAX_ROWS: &str = "QUERYPAD_MAX_ROWS";

// =============================================================================
// Query Defaults
// =============================================================================

/// Default output format
pub const DEFAULT_OUTPUT_FORMAT: &str = "csv";

/// Default row limit
pub const DEFAULT_MAX_ROWS: i64 = 1000;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
