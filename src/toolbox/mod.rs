//! Storage-backed tool registry with semantic retrieval
//!
//! A [`Toolbox`] persists tool metadata as documents (one per tool name)
//! through a [`MemoryProvider`], embeds each document at registration time,
//! and answers natural-language queries by ranking stored embeddings with
//! cosine similarity. Retrieval is an exhaustive scan: toolboxes hold tens
//! of tools, not millions of documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use memora::toolbox::Toolbox;
//!
//! let toolbox = Toolbox::new(provider, embedder);
//! toolbox.register_tool(&StockPriceTool::new(), false).await?;
//!
//! let hits = toolbox.search("what does AAPL trade at?", 2).await?;
//! for hit in hits {
//!     println!("{} ({:.3})", hit.document.name, hit.score);
//! }
//! ```

use crate::db::{MemoryProvider, RecordKind};
use crate::embedding::{cosine_similarity, Embedder};
use crate::llm::LLMClient;
use crate::tools::Tool;
use crate::types::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const AUGMENT_SYSTEM_PROMPT: &str = "You write retrieval descriptions for callable tools. \
Given a tool's name, description, and parameter schema, respond with one concise paragraph \
describing what the tool does and the kinds of natural-language requests it can answer. \
Respond with the description only, no preamble.";

/// A registered tool as persisted by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDocument {
    /// Storage key.
    #[serde(rename = "_id")]
    pub id: String,
    /// Tool name; unique within a toolbox.
    pub name: String,
    /// Human- and retrieval-facing description.
    pub description: String,
    /// JSON Schema of the tool's arguments.
    pub parameters: serde_json::Value,
    /// Embedding of the name and description.
    pub embedding: Vec<f32>,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// A search hit: a stored tool plus its cosine score against the query.
#[derive(Debug, Clone)]
pub struct ScoredTool {
    pub document: ToolDocument,
    pub score: f32,
}

/// Field patch for [`Toolbox::update_tool_by_id`].
#[derive(Debug, Clone, Default)]
pub struct ToolUpdate {
    /// New description; triggers a re-embed.
    pub description: Option<String>,
    /// New parameter schema.
    pub parameters: Option<serde_json::Value>,
}

/// Tool document store bound to a provider and an embedder.
pub struct Toolbox {
    provider: Arc<dyn MemoryProvider>,
    embedder: Arc<dyn Embedder>,
    augmenter: Option<Arc<dyn LLMClient>>,
}

impl Toolbox {
    pub fn new(provider: Arc<dyn MemoryProvider>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            provider,
            embedder,
            augmenter: None,
        }
    }

    /// Enable LLM-based description augmentation at registration time.
    pub fn with_augmenter(mut self, llm: Arc<dyn LLMClient>) -> Self {
        self.augmenter = Some(llm);
        self
    }

    /// Register a tool, replacing any stored tool of the same name.
    ///
    /// With `augment` set and an augmenter configured, the description is
    /// rewritten by the LLM before embedding; augmentation failures fall
    /// back to the tool's own description.
    pub async fn register_tool(&self, tool: &dyn Tool, augment: bool) -> Result<ToolDocument> {
        let mut description = tool.description().to_string();

        if augment {
            if let Some(llm) = &self.augmenter {
                match augment_description(llm.as_ref(), tool).await {
                    Ok(rewritten) => description = rewritten,
                    Err(e) => {
                        tracing::warn!(
                            tool = tool.name(),
                            error = %e,
                            "description augmentation failed, keeping original"
                        );
                    }
                }
            }
        }

        let embedding = self
            .embedder
            .embed(&embedding_text(tool.name(), &description))
            .await?;

        let document = ToolDocument {
            id: Uuid::new_v4().to_string(),
            name: tool.name().to_string(),
            description,
            parameters: tool.parameters_schema(),
            embedding,
            created_at: Utc::now(),
        };

        // one stored document per tool name
        self.provider
            .delete_by_name(RecordKind::Tool, &document.name)
            .await?;
        self.provider
            .store(RecordKind::Tool, encode(&document)?)
            .await?;

        tracing::info!(tool = %document.name, id = %document.id, "registered tool");
        Ok(document)
    }

    pub async fn get_tool_by_name(&self, name: &str) -> Result<Option<ToolDocument>> {
        self.provider
            .retrieve_by_name(RecordKind::Tool, name)
            .await?
            .map(decode)
            .transpose()
    }

    pub async fn get_tool_by_id(&self, id: &str) -> Result<Option<ToolDocument>> {
        self.provider
            .retrieve_by_id(RecordKind::Tool, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// All stored tools.
    pub async fn list_tools(&self) -> Result<Vec<ToolDocument>> {
        self.provider
            .list_all(RecordKind::Tool)
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// The stored tools most similar to a natural-language query,
    /// best first, at most `limit` of them.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredTool>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<ScoredTool> = self
            .list_tools()
            .await?
            .into_iter()
            .map(|document| {
                let score = cosine_similarity(&query_embedding, &document.embedding);
                ScoredTool { document, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    /// Patch a stored tool. A description change re-embeds the document.
    pub async fn update_tool_by_id(&self, id: &str, update: ToolUpdate) -> Result<ToolDocument> {
        let mut document = self
            .get_tool_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no tool with id {}", id)))?;

        if let Some(parameters) = update.parameters {
            document.parameters = parameters;
        }
        if let Some(description) = update.description {
            document.description = description;
            document.embedding = self
                .embedder
                .embed(&embedding_text(&document.name, &document.description))
                .await?;
        }

        self.provider
            .update_by_id(RecordKind::Tool, id, encode(&document)?)
            .await?;
        Ok(document)
    }

    /// Returns whether a tool of that name existed.
    pub async fn delete_tool_by_name(&self, name: &str) -> Result<bool> {
        self.provider.delete_by_name(RecordKind::Tool, name).await
    }

    /// Returns whether a tool with that id existed.
    pub async fn delete_tool_by_id(&self, id: &str) -> Result<bool> {
        self.provider.delete_by_id(RecordKind::Tool, id).await
    }

    /// Remove every stored tool; returns how many went away.
    pub async fn delete_all(&self) -> Result<u64> {
        self.provider.delete_all(RecordKind::Tool).await
    }
}

/// The text a tool document is embedded from.
fn embedding_text(name: &str, description: &str) -> String {
    format!("{}: {}", name, description)
}

async fn augment_description(llm: &dyn LLMClient, tool: &dyn Tool) -> Result<String> {
    let prompt = format!(
        "name: {}\ndescription: {}\nparameters: {}",
        tool.name(),
        tool.description(),
        tool.parameters_schema()
    );
    let rewritten = llm
        .generate_with_system(AUGMENT_SYSTEM_PROMPT, &prompt)
        .await?;
    let rewritten = rewritten.trim();
    if rewritten.is_empty() {
        return Err(AppError::LLM(
            "augmenter returned an empty description".to_string(),
        ));
    }
    Ok(rewritten.to_string())
}

fn encode(document: &ToolDocument) -> Result<serde_json::Value> {
    serde_json::to_value(document)
        .map_err(|e| AppError::Internal(format!("tool document encode failed: {}", e)))
}

fn decode(value: serde_json::Value) -> Result<ToolDocument> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Storage(format!("stored tool document is malformed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_text() {
        assert_eq!(
            embedding_text("get_weather", "Current temperature"),
            "get_weather: Current temperature"
        );
    }

    #[test]
    fn test_document_serde_uses_storage_id() {
        let document = ToolDocument {
            id: "abc".to_string(),
            name: "get_weather".to_string(),
            description: "d".to_string(),
            parameters: serde_json::json!({"type": "object"}),
            embedding: vec![0.1, 0.2],
            created_at: Utc::now(),
        };

        let value = encode(&document).unwrap();
        assert_eq!(value["_id"], "abc");
        assert!(value.get("id").is_none());

        let back = decode(value).unwrap();
        assert_eq!(back.id, "abc");
        assert_eq!(back.embedding.len(), 2);
    }
}
