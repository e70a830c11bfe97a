//! Predictor service access

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use gantry_core::config::PredictorConfig;
use gantry_core::EvidenceError;

use crate::types::EvidenceResult;

/// One reply from the predictor
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleReply {
    /// The predictor is still computing, ask again later
    Pending,
    /// Results are available
    Ready(EvidenceResult),
}

/// Anything that can answer a schedules query for a push
pub trait ScheduleSource: Send + Sync {
    /// Ask once for the schedules of `branch`@`rev`
    fn fetch(&self, branch: &str, rev: &str) -> Result<ScheduleReply, EvidenceError>;
}

/// Predictor reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpScheduleSource {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpScheduleSource {
    /// Create a source for the given base URL
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, EvidenceError> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("gantry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EvidenceError::Http {
                url: base_url.clone(),
                status: None,
                message: e.to_string(),
            })?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    /// Create a source from predictor configuration
    pub fn from_config(config: &PredictorConfig) -> Result<Self, EvidenceError> {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }

    /// URL of the schedules endpoint for a push
    pub fn schedules_url(&self, branch: &str, rev: &str) -> String {
        format!(
            "{}/push/{}/{}/schedules",
            self.base_url.trim_end_matches('/'),
            branch,
            rev
        )
    }
}

impl ScheduleSource for HttpScheduleSource {
    fn fetch(&self, branch: &str, rev: &str) -> Result<ScheduleReply, EvidenceError> {
        let url = self.schedules_url(branch, rev);
        debug!(url = %url, "querying predictor");

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request.send().map_err(|e| EvidenceError::Http {
            url: url.clone(),
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            return Ok(ScheduleReply::Pending);
        }

        if !status.is_success() {
            return Err(EvidenceError::Http {
                url,
                status: Some(status.as_u16()),
                message: format!("unexpected status {}", status),
            });
        }

        let body = response.text().map_err(|e| EvidenceError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if body.trim().is_empty() {
            return Ok(ScheduleReply::Ready(EvidenceResult::default()));
        }

        let evidence = serde_json::from_str(&body).map_err(|e| EvidenceError::Decode {
            url,
            message: e.to_string(),
        })?;

        Ok(ScheduleReply::Ready(evidence))
    }
}
