//! Error classification shared by retry and search-branch isolation.

use serde::{Deserialize, Serialize};

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    Contract,
    Unknown,
}

/// Structured details returned by a provider API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetails {
    pub provider_code: Option<String>,
    pub param: Option<String>,
    pub request_id: Option<String>,
}

impl ErrorDetails {
    /// Pull `code`/`param` out of an OpenAI-style `{"error": {...}}` body.
    pub fn from_body(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let error = value.get("error")?;
        Some(Self {
            provider_code: error
                .get("code")
                .and_then(|c| c.as_str())
                .map(str::to_string),
            param: error
                .get("param")
                .and_then(|p| p.as_str())
                .map(str::to_string),
            request_id: None,
        })
    }
}
