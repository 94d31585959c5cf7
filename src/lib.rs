//! # memora
//!
//! An agent toolbox engine: plain Rust functions become callable tools,
//! tool metadata is persisted and embedded for semantic retrieval, and
//! persisted agents answer natural-language instructions by calling the
//! tools attached to them.
//!
//! ## Overview
//!
//! memora can be used in two ways:
//!
//! 1. **As a binary** - the `memora` CLI walks the whole flow: register,
//!    search, update, delete, attach, run.
//! 2. **As a library** - import the pieces into your own project.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use memora::{db::ProviderConfig, embedding::OpenAIEmbedder, toolbox::Toolbox};
//! use memora::tools::StockPriceTool;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ProviderConfig::from_env().connect().await?;
//!     let embedder = Arc::new(OpenAIEmbedder::new(
//!         std::env::var("OPENAI_API_KEY")?,
//!         "https://api.openai.com/v1".into(),
//!         "text-embedding-3-small".into(),
//!     ));
//!
//!     let toolbox = Toolbox::new(provider, embedder);
//!     toolbox.register_tool(&StockPriceTool::new(), false).await?;
//!
//!     for hit in toolbox.search("what does AAPL trade at?", 2).await? {
//!         println!("{} ({:.3})", hit.document.name, hit.score);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - persisted agents and the tool-calling run loop
//! - [`db`] - storage providers (MongoDB, in-memory)
//! - [`embedding`] - embedding service and cosine ranking
//! - [`llm`] - LLM client abstraction (OpenAI)
//! - [`toolbox`] - tool document store with semantic retrieval
//! - [`tools`] - the tool trait, registry, and bundled tools
//! - [`types`] - common types and error handling

/// Persisted agents and the tool-calling run loop.
pub mod agents;
/// Storage providers (MongoDB, in-memory).
pub mod db;
/// Embedding service and cosine ranking.
pub mod embedding;
/// LLM provider clients and abstractions.
pub mod llm;
/// Tool document store with semantic retrieval.
pub mod toolbox;
/// Tool trait, registry, and the bundled lookup tools.
pub mod tools;
/// Core types (tool definitions, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::MemAgent;
pub use db::{InMemoryProvider, MemoryProvider, MongoProvider, ProviderConfig, RecordKind};
pub use embedding::{Embedder, OpenAIEmbedder};
pub use llm::{LLMClient, LLMResponse, Provider};
pub use toolbox::{ScoredTool, Toolbox, ToolDocument, ToolUpdate};
pub use tools::{QuoteClient, StockPriceTool, Tool, ToolRegistry, WeatherClient, WeatherTool};
pub use types::{AppError, Result};
pub use utils::Config;
