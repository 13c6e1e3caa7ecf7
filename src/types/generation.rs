//! Generation settings and related enums.

use std::collections::HashMap;

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which provider API an agent talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiType {
    Azure,
    Bedrock,
    FastChat,
    OpenAi,
    VertexAi,
}

const fn default_timeout_secs() -> u64 {
    120
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_n_candidates() -> u32 {
    1
}

/// Per-agent provider and sampling configuration.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub api_type: ApiType,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub organization: Option<String>,
    pub base_url: Option<String>,
    #[builder(default = default_timeout_secs())]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[builder(default = default_max_retries())]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    pub azure_deployment: Option<String>,
    pub region: Option<String>,
    pub project_id: Option<String>,
    /// Number of parallel candidates to request (`n` for OpenAI).
    #[builder(default = default_n_candidates())]
    #[serde(default = "default_n_candidates")]
    pub n_candidates: u32,
    pub frequency_penalty: Option<f64>,
    pub logit_bias: Option<HashMap<String, i32>>,
    pub max_tokens: Option<u32>,
    pub presence_penalty: Option<f64>,
    pub seed: Option<u64>,
    pub stop_sequences: Option<Vec<String>>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub tool_choice: Option<serde_json::Value>,
}

impl GenerationConfig {
    /// Defaults for the given API type.
    pub fn new(api_type: ApiType) -> Self {
        Self::builder().api_type(api_type).build()
    }
}

/// A structural schema the final textual reply must validate against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Check that `text` is JSON matching the schema.
    pub fn validate(&self, text: &str) -> Result<(), String> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| format!("reply is not JSON: {e}"))?;
        crate::tools::validation::validate_value(&value, &self.schema)
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_type_round_trips_through_strings() {
        assert_eq!("azure".parse::<ApiType>().unwrap(), ApiType::Azure);
        assert_eq!("fastchat".parse::<ApiType>().unwrap(), ApiType::FastChat);
        assert_eq!(ApiType::VertexAi.to_string(), "vertexai");
        assert!("anthropic".parse::<ApiType>().is_err());
    }

    #[test]
    fn builder_fills_defaults() {
        let config = GenerationConfig::builder()
            .api_type(ApiType::OpenAi)
            .model("gpt-4o".to_string())
            .temperature(0.2)
            .build();
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.n_candidates, 1);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn output_schema_rejects_non_json_and_missing_fields() {
        let schema = OutputSchema::new(
            "score",
            serde_json::json!({
                "type": "object",
                "properties": { "score": { "type": "number" } },
                "required": ["score"],
            }),
        );
        assert!(schema.validate(r#"{"score": 7}"#).is_ok());
        assert!(schema.validate("seven").is_err());
        assert!(schema.validate(r#"{"grade": 7}"#).is_err());
    }
}
