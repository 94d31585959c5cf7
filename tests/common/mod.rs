//! Shared test doubles for the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use memora::embedding::Embedder;
use memora::llm::{ConversationMessage, LLMClient, LLMResponse};
use memora::types::{Result, ToolDefinition};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Deterministic embedder: one vector component per topic, plus a bias
/// component so unrelated texts still have a finite angle between them.
pub struct KeywordEmbedder;

fn keyword_hits(text: &str, keywords: &[&str]) -> f32 {
    keywords.iter().filter(|k| text.contains(*k)).count() as f32
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(vec![
            keyword_hits(&text, &["stock", "price", "ticker", "trade", "share"]),
            keyword_hits(&text, &["weather", "temperature", "forecast", "coordinates"]),
            0.25,
        ])
    }

    fn model_name(&self) -> &str {
        "keyword-embedder"
    }
}

/// LLM double that replays a fixed sequence of responses and records every
/// conversation it was shown.
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<LLMResponse>>,
    pub seen: Mutex<Vec<Vec<ConversationMessage>>>,
}

impl ScriptedLLM {
    pub fn new(responses: Vec<LLMResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Plain text response with no tool calls.
    pub fn text(content: &str) -> LLMResponse {
        LLMResponse {
            content: content.to_string(),
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        }
    }

    /// Response requesting a single tool call.
    pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> LLMResponse {
        LLMResponse {
            content: String::new(),
            tool_calls: vec![memora::types::ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }],
            finish_reason: "tool_calls".to_string(),
        }
    }

    pub fn calls_made(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("ok".to_string())
    }

    async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok("ok".to_string())
    }

    async fn generate_with_tools(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.seen.lock().push(messages.to_vec());
        let next = self.responses.lock().pop_front();
        Ok(next.unwrap_or_else(|| ScriptedLLM::text("done")))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
