//! Configuration (layered: code > env > `.env` file) and TOML session files.

pub mod session;

pub use session::{AgentSpec, SessionFile};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::types::ApiType;

/// Credentials and endpoints per provider API.
///
/// Values set on a [`GenerationConfig`](crate::types::GenerationConfig)
/// take precedence; this store is the fallback.
#[derive(Debug, Clone, Default)]
pub struct AgentxConfig {
    api_keys: Arc<RwLock<HashMap<ApiType, String>>>,
    base_urls: Arc<RwLock<HashMap<ApiType, String>>>,
}

impl AgentxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables (`OPENAI_API_KEY`, `AZURE_OPENAI_KEY`, ...).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let config = Self::new();

        let key_mappings = [
            ("OPENAI_API_KEY", ApiType::OpenAi),
            ("AZURE_OPENAI_KEY", ApiType::Azure),
            ("FASTCHAT_API_KEY", ApiType::FastChat),
        ];
        for (env_var, api_type) in key_mappings {
            if let Ok(key) = std::env::var(env_var) {
                config.set_api_key(api_type, key);
            }
        }

        let url_mappings = [
            ("OPENAI_BASE_URL", ApiType::OpenAi),
            ("AZURE_OPENAI_ENDPOINT", ApiType::Azure),
            ("FASTCHAT_BASE_URL", ApiType::FastChat),
        ];
        for (env_var, api_type) in url_mappings {
            if let Ok(url) = std::env::var(env_var) {
                config.set_base_url(api_type, url);
            }
        }

        config
    }

    pub fn set_api_key(&self, api_type: ApiType, key: String) {
        if let Ok(mut keys) = self.api_keys.write() {
            keys.insert(api_type, key);
        }
    }

    pub fn get_api_key(&self, api_type: ApiType) -> Option<String> {
        self.api_keys.read().ok()?.get(&api_type).cloned()
    }

    pub fn set_base_url(&self, api_type: ApiType, url: String) {
        if let Ok(mut urls) = self.base_urls.write() {
            urls.insert(api_type, url);
        }
    }

    pub fn get_base_url(&self, api_type: ApiType) -> Option<String> {
        self.base_urls.read().ok()?.get(&api_type).cloned()
    }

    pub fn has_credentials(&self, api_type: ApiType) -> bool {
        self.get_api_key(api_type).is_some()
    }
}
