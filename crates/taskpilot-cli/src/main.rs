mod session;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::env;
use std::sync::Arc;

use taskpilot::agent::Agent;
use taskpilot::providers::configs::{OllamaProviderConfig, OpenAiProviderConfig, ProviderConfig};
use taskpilot::providers::factory;
use taskpilot::providers::ollama::{OLLAMA_HOST, OLLAMA_MODEL};
use taskpilot::todoist::{TodoistClient, TodoistConfig};
use taskpilot::tools;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Provider to chat with
    #[arg(short, long, default_value = "open-ai")]
    #[arg(value_enum)]
    provider: ProviderVariant,

    /// Model to use, overriding the provider default
    #[arg(short, long)]
    model: Option<String>,

    /// OpenAI API key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(ValueEnum, Clone, Debug)]
enum ProviderVariant {
    OpenAi,
    Ollama,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let provider = factory::get_provider(provider_config(&cli)?)?;

    let api_token = env::var("TODOIST_API_TOKEN")
        .context("TODOIST_API_TOKEN environment variable must be set")?;
    let api = Arc::new(TodoistClient::new(TodoistConfig::new(api_token))?);

    let mut agent = Agent::new(provider);
    tools::install(&mut agent, api)?;

    session::Session::new(agent).start().await
}

fn provider_config(cli: &Cli) -> Result<ProviderConfig> {
    match cli.provider {
        ProviderVariant::OpenAi => {
            let api_key = cli
                .api_key
                .clone()
                .or_else(|| env::var("OPENAI_API_KEY").ok())
                .context(
                    "API key must be provided via --api-key or OPENAI_API_KEY environment variable",
                )?;

            Ok(ProviderConfig::OpenAi(OpenAiProviderConfig {
                host: env::var("OPENAI_HOST")
                    .unwrap_or_else(|_| "https://api.openai.com".to_string()),
                api_key,
                model: cli.model.clone().unwrap_or_else(|| "gpt-4o".to_string()),
                temperature: None,
                max_tokens: None,
            }))
        }
        ProviderVariant::Ollama => Ok(ProviderConfig::Ollama(OllamaProviderConfig {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| OLLAMA_HOST.to_string()),
            model: cli.model.clone().unwrap_or_else(|| OLLAMA_MODEL.to_string()),
            temperature: None,
            max_tokens: None,
        })),
    }
}
