//! Sequential toolbox demo.
//!
//! Each subcommand is one step of the flow: register the bundled tools,
//! inspect and search them, wire them to a persisted agent, and run the
//! agent against a natural-language instruction.

use anyhow::Context;
use clap::{Parser, Subcommand};
use memora::{
    agents::{MemAgent, DEFAULT_INSTRUCTION},
    db::{MemoryProvider, ProviderConfig},
    embedding::{Embedder, OpenAIEmbedder},
    llm::{LLMClient, Provider},
    toolbox::{Toolbox, ToolUpdate},
    tools::{QuoteClient, ToolRegistry, WeatherClient},
    utils::Config,
};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "memora",
    version,
    about = "Toolbox demo: register tools, search them semantically, and run them through an agent"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register the bundled tools (get_stock_price, get_weather)
    Register {
        /// Rewrite tool descriptions with the LLM before embedding
        #[arg(long)]
        augment: bool,
    },
    /// List all stored tools
    List,
    /// Semantic search over stored tools
    Search {
        query: String,
        #[arg(long, default_value_t = 2)]
        limit: usize,
    },
    /// Show one stored tool by name
    Show { name: String },
    /// Update a stored tool's description by id
    Update {
        id: String,
        #[arg(long)]
        description: String,
    },
    /// Delete a stored tool by name or id, or everything
    Delete {
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        id: Option<String>,
        #[arg(long, conflicts_with_all = ["name", "id"])]
        all: bool,
    },
    /// Agent operations
    #[command(subcommand)]
    Agent(AgentCommand),
    /// Call the price helper directly
    Price {
        symbol: String,
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    /// Call the weather helper directly
    Weather { latitude: f64, longitude: f64 },
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Create and persist an agent with every stored tool attached
    Create {
        #[arg(long)]
        instruction: Option<String>,
    },
    /// Run a persisted agent against a natural-language instruction
    Run { id: String, query: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Register { augment } => {
            let toolbox = build_toolbox(&config, augment).await?;
            let registry = ToolRegistry::with_default_tools();
            for name in registry.tool_names() {
                let tool = registry
                    .get(&name)
                    .context("registry lost a tool it just listed")?;
                let document = toolbox.register_tool(tool.as_ref(), augment).await?;
                println!(
                    "{} registered {} ({})",
                    "✓".green(),
                    document.name.bold(),
                    document.id
                );
            }
        }
        Command::List => {
            let toolbox = build_toolbox(&config, false).await?;
            let tools = toolbox.list_tools().await?;
            if tools.is_empty() {
                println!("no tools registered");
            }
            for document in tools {
                println!(
                    "{}  {}  {}",
                    document.id.dimmed(),
                    document.name.bold(),
                    document.description
                );
            }
        }
        Command::Search { query, limit } => {
            let toolbox = build_toolbox(&config, false).await?;
            for hit in toolbox.search(&query, limit).await? {
                println!(
                    "{:.3}  {}  {}",
                    hit.score,
                    hit.document.name.bold(),
                    hit.document.description
                );
            }
        }
        Command::Show { name } => {
            let toolbox = build_toolbox(&config, false).await?;
            match toolbox.get_tool_by_name(&name).await? {
                Some(document) => {
                    println!("{}", serde_json::to_string_pretty(&document)?);
                }
                None => println!("no tool named {}", name),
            }
        }
        Command::Update { id, description } => {
            let toolbox = build_toolbox(&config, false).await?;
            let document = toolbox
                .update_tool_by_id(
                    &id,
                    ToolUpdate {
                        description: Some(description),
                        ..Default::default()
                    },
                )
                .await?;
            println!("{} updated {}", "✓".green(), document.name.bold());
        }
        Command::Delete { name, id, all } => {
            let toolbox = build_toolbox(&config, false).await?;
            if all {
                let removed = toolbox.delete_all().await?;
                println!("{} removed {} tools", "✓".green(), removed);
            } else if let Some(id) = id {
                let removed = toolbox.delete_tool_by_id(&id).await?;
                println!("{}", if removed { "deleted" } else { "nothing to delete" });
            } else if let Some(name) = name {
                let removed = toolbox.delete_tool_by_name(&name).await?;
                println!("{}", if removed { "deleted" } else { "nothing to delete" });
            } else {
                anyhow::bail!("pass a tool name, --id, or --all");
            }
        }
        Command::Agent(AgentCommand::Create { instruction }) => {
            let provider = connect_provider(&config).await?;
            let toolbox = toolbox_on(provider.clone(), &config, false)?;
            let registry = ToolRegistry::with_default_tools();

            let mut agent = MemAgent::new(
                provider,
                build_llm(&config)?,
                instruction.unwrap_or_else(|| DEFAULT_INSTRUCTION.to_string()),
            );
            let attached = agent.attach_toolbox(&toolbox, &registry).await?;
            agent.save().await?;

            println!(
                "{} agent {} saved with {} tools",
                "✓".green(),
                agent.id().bold(),
                attached
            );
        }
        Command::Agent(AgentCommand::Run { id, query }) => {
            let provider = connect_provider(&config).await?;
            let registry = ToolRegistry::with_default_tools();
            let agent = MemAgent::load(provider, build_llm(&config)?, &registry, &id).await?;

            let answer = agent.run(&query).await?;
            println!("{}", answer);
        }
        Command::Price { symbol, currency } => {
            let client = QuoteClient::new();
            let line = client.price_line(&symbol, &currency, 3, 1.0).await?;
            println!("{}", line);
        }
        Command::Weather {
            latitude,
            longitude,
        } => {
            let client = WeatherClient::new();
            let temperature = client.current_temperature(latitude, longitude).await?;
            println!("{} °C", temperature);
        }
    }

    Ok(())
}

async fn connect_provider(config: &Config) -> anyhow::Result<Arc<dyn MemoryProvider>> {
    let provider_config = match &config.mongodb_uri {
        Some(uri) => ProviderConfig::MongoDb {
            uri: uri.clone(),
            database: config.mongodb_database.clone(),
        },
        None => {
            tracing::warn!("MONGODB_URI is not set, using in-memory storage (lost on exit)");
            ProviderConfig::Memory
        }
    };
    Ok(provider_config.connect().await?)
}

fn build_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is required for embeddings")?;
    Ok(Arc::new(OpenAIEmbedder::new(
        api_key,
        config.openai_api_base.clone(),
        config.embedding_model.clone(),
    )))
}

fn build_llm(config: &Config) -> anyhow::Result<Box<dyn LLMClient>> {
    let api_key = config
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY is required for the LLM")?;
    let provider = Provider::OpenAI {
        api_key,
        api_base: config.openai_api_base.clone(),
        model: config.openai_model.clone(),
    };
    Ok(provider.create_client()?)
}

fn toolbox_on(
    provider: Arc<dyn MemoryProvider>,
    config: &Config,
    with_augmenter: bool,
) -> anyhow::Result<Toolbox> {
    let mut toolbox = Toolbox::new(provider, build_embedder(config)?);
    if with_augmenter {
        toolbox = toolbox.with_augmenter(Arc::from(build_llm(config)?));
    }
    Ok(toolbox)
}

async fn build_toolbox(config: &Config, with_augmenter: bool) -> anyhow::Result<Toolbox> {
    let provider = connect_provider(config).await?;
    toolbox_on(provider, config, with_augmenter)
}
