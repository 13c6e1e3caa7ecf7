//! Provider factories keyed on [`ApiType`].

use std::collections::HashMap;
use std::sync::Arc;

use super::ProviderClient;
use crate::config::AgentxConfig;
use crate::error::AgentxError;
use crate::types::{ApiType, GenerationConfig};

/// Builds provider clients for one or more API types.
pub trait ProviderFactory: Send + Sync {
    /// API types this factory handles.
    fn api_types(&self) -> &[ApiType];

    /// Create a client for `generation`, falling back to `config` for
    /// credentials and endpoints it does not carry.
    fn create(
        &self,
        generation: &GenerationConfig,
        config: &AgentxConfig,
    ) -> Result<Arc<dyn ProviderClient>, AgentxError>;
}

/// Registry mapping API types to their factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<ApiType, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in chat-completions client registered for
    /// OpenAI, Azure and FastChat. VertexAI and Bedrock need a caller
    /// supplied factory.
    pub fn with_builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "openai")]
        registry.register(Arc::new(super::openai::OpenAiChatFactory));
        registry
    }

    /// Register a factory for all API types it declares, replacing any
    /// earlier registration.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        for api_type in factory.api_types() {
            self.factories.insert(*api_type, Arc::clone(&factory));
        }
    }

    pub fn create_provider(
        &self,
        generation: &GenerationConfig,
        config: &AgentxConfig,
    ) -> Result<Arc<dyn ProviderClient>, AgentxError> {
        self.factories
            .get(&generation.api_type)
            .ok_or(AgentxError::ProviderNotRegistered(generation.api_type))?
            .create(generation, config)
    }

    pub fn has_provider(&self, api_type: ApiType) -> bool {
        self.factories.contains_key(&api_type)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("api_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderRequest, ProviderResponse};
    use crate::types::Message;
    use async_trait::async_trait;

    struct StubFactory;

    impl ProviderFactory for StubFactory {
        fn api_types(&self) -> &[ApiType] {
            &[ApiType::VertexAi, ApiType::Bedrock]
        }

        fn create(
            &self,
            generation: &GenerationConfig,
            _config: &AgentxConfig,
        ) -> Result<Arc<dyn ProviderClient>, AgentxError> {
            Ok(Arc::new(StubProvider {
                name: generation.api_type.to_string(),
            }))
        }
    }

    struct StubProvider {
        name: String,
    }

    #[async_trait]
    impl ProviderClient for StubProvider {
        fn provider_name(&self) -> &str {
            &self.name
        }

        async fn generate(&self, _request: &ProviderRequest) -> Result<ProviderResponse, AgentxError> {
            Ok(ProviderResponse::single(Message::assistant("stub")))
        }
    }

    #[test]
    fn register_and_create() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubFactory));

        assert!(registry.has_provider(ApiType::VertexAi));
        assert!(registry.has_provider(ApiType::Bedrock));
        assert!(!registry.has_provider(ApiType::Azure));

        let provider = registry
            .create_provider(&GenerationConfig::new(ApiType::Bedrock), &AgentxConfig::new())
            .unwrap();
        assert_eq!(provider.provider_name(), "bedrock");
    }

    #[test]
    fn create_unregistered_fails() {
        let registry = ProviderRegistry::new();
        let result = registry.create_provider(&GenerationConfig::new(ApiType::VertexAi), &AgentxConfig::new());
        match result {
            Err(AgentxError::ProviderNotRegistered(ApiType::VertexAi)) => {}
            Err(e) => panic!("expected ProviderNotRegistered, got error: {e}"),
            Ok(_) => panic!("expected ProviderNotRegistered, got Ok"),
        }
    }

    #[cfg(feature = "openai")]
    #[test]
    fn builtin_covers_openai_family_only() {
        let registry = ProviderRegistry::with_builtin();
        assert!(registry.has_provider(ApiType::OpenAi));
        assert!(registry.has_provider(ApiType::Azure));
        assert!(registry.has_provider(ApiType::FastChat));
        assert!(!registry.has_provider(ApiType::VertexAi));
    }
}
