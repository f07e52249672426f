//! OpenAI provider implementation
//!
//! OpenAI is the reference chat-completions API; the adapter only carries
//! OpenAI defaults and an overridable base URL for proxies and Azure-style gateways.

use super::compat::chat_completions_provider;

pub const OPENAI_PROVIDER: &str = "openai";

chat_completions_provider! {
    /// OpenAI provider configuration
    config OpenAiConfig;
    /// OpenAI provider implementation
    provider OpenAiProvider;
    name = OPENAI_PROVIDER,
    model = "gpt-4o-mini",
    temperature = 0.7,
    base_url = "https://api.openai.com/v1",
}
