//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Main configuration for gantry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Relevance predictor settings
    pub predictor: PredictorConfig,

    /// Push log settings
    pub pushlog: PushLogConfig,

    /// Backstop cadence
    pub backstop: BackstopConfig,

    /// Confidence selection settings
    pub selection: SelectionConfig,

    /// Group dispersal settings
    pub dispersal: DispersalConfig,

    /// Extra project policies
    pub policies: Vec<PolicyConfig>,
}

/// Relevance predictor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Service base URL
    pub base_url: String,

    /// Value of the `X-API-KEY` header
    pub api_key: Option<String>,

    /// Maximum total wait for a pending push (seconds)
    pub timeout_secs: u64,

    /// Delay between polls (seconds)
    pub retry_interval_secs: u64,

    /// Projects the predictor strategies act on
    pub projects: Vec<String>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PREDICTOR_URL.to_string(),
            api_key: Some(DEFAULT_PREDICTOR_API_KEY.to_string()),
            timeout_secs: RETRY_TIMEOUT_SECS,
            retry_interval_secs: RETRY_INTERVAL_SECS,
            projects: default_predictor_projects(),
        }
    }
}

impl PredictorConfig {
    /// Maximum total wait as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Poll interval as a duration
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

/// Push log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushLogConfig {
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for PushLogConfig {
    fn default() -> Self {
        Self {
            timeout_secs: PUSHLOG_TIMEOUT_SECS,
        }
    }
}

/// Backstop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackstopConfig {
    /// Every Nth push runs everything
    pub push_interval: i64,

    /// Projects where `skip-unless-push-interval` removes tasks; all when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_on_projects: Option<Vec<String>>,
}

impl Default for BackstopConfig {
    fn default() -> Self {
        Self {
            push_interval: BACKSTOP_PUSH_INTERVAL,
            remove_on_projects: None,
        }
    }
}

/// Confidence selection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Threshold used by `bugbug-push-schedules`
    pub default_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            default_threshold: CT_MEDIUM,
        }
    }
}

/// Dispersal target counts per importance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersalConfig {
    /// Tasks kept per low importance group
    pub low: usize,
    /// Tasks kept per medium importance group
    pub medium: usize,
    /// Tasks kept per high importance group
    pub high: usize,
    /// Extra slots for a configuration not yet covered
    pub unseen_modifier: usize,
}

impl Default for DispersalConfig {
    fn default() -> Self {
        Self {
            low: 1,
            medium: 2,
            high: 3,
            unseen_modifier: 1,
        }
    }
}

/// A policy declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Project name
    pub project: String,
    /// Purpose, e.g. "test"
    pub purpose: String,
    /// Strategy tree
    pub strategy: StrategySpec,
}

/// Strategy composition tree
///
/// ```toml
/// strategy = { any = ["skip-unless-schedules", { all = ["bugbug-low", { not = "skip-unless-backstop" }] }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategySpec {
    /// A registered strategy
    Named(String),
    /// Remove when any child removes
    Any { any: Vec<StrategySpec> },
    /// Remove when every child removes
    All { all: Vec<StrategySpec> },
    /// Invert a child
    Not { not: Box<StrategySpec> },
}

impl StrategySpec {
    /// Every strategy name referenced by this tree
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Named(name) => vec![name.as_str()],
            Self::Any { any: children } | Self::All { all: children } => {
                children.iter().flat_map(|c| c.names()).collect()
            }
            Self::Not { not } => not.names(),
        }
    }
}
