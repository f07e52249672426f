//! Observability for llm-core: structured logging and the provider call span

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};

// Span macro for provider calls
pub use logging::chat_span;
