//! llm-core command line entry point
//!
//! Sends one chat request through the configured provider, extracts JSON from
//! text on stdin, or prices a token count.

use clap::{Parser, Subcommand};
use futures::StreamExt;
use llm_core::config::CoreConfig;
use llm_core::llm::{ChatMessage, ChatRequest, ProviderOptions, TokenUsage};
use llm_core::observability::init_default_logging;
use llm_core::output::{extract_field, extract_json, format_cost, PriceTable};
use serde_json::Value;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

/// Provider-neutral LLM chat client
#[derive(Parser)]
#[command(name = "llm-core")]
#[command(about = "Provider-neutral LLM chat, JSON extraction and cost estimates")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "LLM_CORE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one prompt to the configured provider
    Chat {
        prompt: String,
        /// System instruction sent before the prompt
        #[arg(long)]
        system: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        temperature: Option<f32>,
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Print text as it arrives
        #[arg(long)]
        stream: bool,
    },
    /// Extract JSON from text read on stdin
    Extract {
        /// Print only this top-level field
        #[arg(long)]
        field: Option<String>,
    },
    /// Estimate the cost of a token count
    Cost {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        prompt_tokens: u32,
        #[arg(long)]
        completion_tokens: u32,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    let result = match cli.command {
        Commands::Chat {
            prompt,
            system,
            model,
            temperature,
            max_tokens,
            stream,
        } => {
            let request = build_request(prompt, system, model.clone(), temperature, max_tokens);
            let overrides = ProviderOptions {
                model,
                temperature,
                max_tokens,
                ..Default::default()
            };
            run_chat(&cli.config, request, overrides, stream).await
        }
        Commands::Extract { field } => run_extract(field),
        Commands::Cost {
            provider,
            model,
            prompt_tokens,
            completion_tokens,
        } => run_cost(&cli.config, &provider, &model, prompt_tokens, completion_tokens),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> Result<CoreConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(CoreConfig::load_from_file(path)?)
        }
        None => Ok(CoreConfig::discover()?),
    }
}

fn build_request(
    prompt: String,
    system: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
) -> ChatRequest {
    let mut messages = Vec::new();
    if let Some(system) = system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    let mut request = ChatRequest::new(messages);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    if let Some(temperature) = temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request
}

async fn run_chat(
    config_path: &Option<PathBuf>,
    request: ChatRequest,
    overrides: ProviderOptions,
    stream: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_configuration(config_path)?;
    let provider = config.create_active_provider_with(overrides)?;
    let mut stdout = std::io::stdout();

    if stream {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());
        let mut deltas = provider.chat_stream(request).await?;
        while let Some(delta) = deltas.next().await {
            write!(stdout, "{}", delta?)?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
        eprintln!(
            "{}",
            cost_line(provider.provider_name(), &model, None, PriceTable::builtin())
        );
        return Ok(());
    }

    let response = provider.chat(request).await?;
    writeln!(stdout, "{}", response.content)?;

    let table = config.price_table()?;
    eprintln!(
        "{}",
        cost_line(&response.provider, &response.model, Some(&response.usage), &table)
    );
    Ok(())
}

/// Summary printed after a chat; streams report no usage, so they get no estimate
fn cost_line(provider: &str, model: &str, usage: Option<&TokenUsage>, table: &PriceTable) -> String {
    match usage {
        Some(usage) => format!(
            "[{provider} {model}] {} prompt + {} completion tokens, {}",
            usage.prompt_tokens,
            usage.completion_tokens,
            format_cost(table.estimate_cost(provider, model, usage))
        ),
        None => format!("[{provider} {model}] streamed response has no usage data, no cost estimate"),
    }
}

fn run_extract(field: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;

    let value = match field {
        Some(field) => extract_field(&text, &field, Value::Null),
        None => extract_json(&text)?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn run_cost(
    config_path: &Option<PathBuf>,
    provider: &str,
    model: &str,
    prompt_tokens: u32,
    completion_tokens: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = match config_path {
        Some(_) => load_configuration(config_path)?.price_table()?,
        None => PriceTable::builtin().clone(),
    };

    let usage = TokenUsage {
        prompt_tokens,
        completion_tokens,
        total_tokens: prompt_tokens.saturating_add(completion_tokens),
    };
    let cost = table.estimate_cost(provider, model, &usage);
    println!("{} (prices updated {})", format_cost(cost), table.updated);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_line_with_usage_prices_tokens() {
        let usage = TokenUsage {
            prompt_tokens: 1_000_000,
            completion_tokens: 1_000_000,
            total_tokens: 2_000_000,
        };
        let line = cost_line("openai", "gpt-4o-mini", Some(&usage), PriceTable::builtin());
        assert!(line.starts_with("[openai gpt-4o-mini] 1000000 prompt + 1000000 completion tokens, $"));
    }

    #[test]
    fn test_cost_line_for_stream_says_no_estimate() {
        let line = cost_line("groq", "llama-3.3-70b-versatile", None, PriceTable::builtin());
        assert_eq!(
            line,
            "[groq llama-3.3-70b-versatile] streamed response has no usage data, no cost estimate"
        );
    }
}
