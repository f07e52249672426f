//! LLM provider implementations
//!
//! Each vendor adapter sits behind a cargo feature of the same name. A disabled
//! feature is reported by the factory as a missing dependency.

pub mod compat;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "groq")]
pub mod groq;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use compat::ChatCompletionsAdapter;
#[cfg(feature = "groq")]
pub use groq::{GroqConfig, GroqProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};
