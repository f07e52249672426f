//! Groq provider implementation
//!
//! Groq serves an OpenAI-compatible chat-completions API, so the heavy lifting
//! lives in [`ChatCompletionsAdapter`](super::compat::ChatCompletionsAdapter).

use super::compat::chat_completions_provider;

pub const GROQ_PROVIDER: &str = "groq";

chat_completions_provider! {
    /// Groq provider configuration
    config GroqConfig;
    /// Groq provider implementation
    provider GroqProvider;
    name = GROQ_PROVIDER,
    model = "llama-3.3-70b-versatile",
    temperature = 0.3,
    base_url = "https://api.groq.com/openai/v1",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::LlmProvider;
    use std::time::Duration;

    #[test]
    fn test_groq_config_default() {
        let config = GroqConfig::default();
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.max_tokens, 2048);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_groq_provider_name_and_default_model() {
        let provider = GroqProvider::new(GroqConfig {
            api_key: "test-key".to_string(),
            model: "gemma2-9b-it".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(provider.provider_name(), "groq");
        assert_eq!(provider.default_model(), "gemma2-9b-it");
    }
}
