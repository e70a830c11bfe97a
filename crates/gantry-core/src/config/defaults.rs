//! Default configuration values

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "gantry.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "gantry.yaml";

/// Base URL of the relevance predictor
pub const DEFAULT_PREDICTOR_URL: &str = "https://bugbug.herokuapp.com";

/// API key sent to the predictor
pub const DEFAULT_PREDICTOR_API_KEY: &str = "gecko-taskgraph";

/// Maximum time to wait for the predictor to become ready (seconds)
pub const RETRY_TIMEOUT_SECS: u64 = 8 * 60;

/// Delay between predictor polls (seconds)
pub const RETRY_INTERVAL_SECS: u64 = 10;

/// Timeout for a single push log request (seconds)
pub const PUSHLOG_TIMEOUT_SECS: u64 = 30;

/// Every Nth push is a backstop push
pub const BACKSTOP_PUSH_INTERVAL: i64 = 20;

/// Low confidence threshold
pub const CT_LOW: f64 = 0.7;

/// Medium confidence threshold
pub const CT_MEDIUM: f64 = 0.8;

/// High confidence threshold
pub const CT_HIGH: f64 = 0.9;

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".gantry.toml",
        ".gantry.yaml",
    ]
}

/// Projects the predictor has data for
pub fn default_predictor_projects() -> Vec<String> {
    vec!["autoland".to_string(), "try".to_string()]
}
