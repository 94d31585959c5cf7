//! Persisted agents that answer instructions through tool calling
//!
//! A [`MemAgent`] is a document (instruction + attached tool ids) stored
//! through the same provider as the toolbox, plus the runtime pieces needed
//! to act: an LLM client and the executable implementations of its attached
//! tools. `run` drives the multi-turn loop: the model sees the attached
//! tool definitions, requested calls are executed locally, results go back
//! to the model, and the loop ends when it answers in plain text.

use crate::db::{MemoryProvider, RecordKind};
use crate::llm::{ConversationMessage, LLMClient};
use crate::toolbox::{ToolDocument, Toolbox};
use crate::tools::{Tool, ToolRegistry};
use crate::types::{AppError, Result, ToolDefinition};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on LLM round-trips per `run`.
const MAX_TOOL_ITERATIONS: usize = 10;

/// Instruction used when an agent is created without one.
pub const DEFAULT_INSTRUCTION: &str =
    "You are a helpful assistant. Use the provided tools when they can answer the request.";

/// The persisted part of an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDocument {
    /// Storage key.
    #[serde(rename = "_id")]
    pub id: String,
    /// System prompt the agent runs with.
    pub instruction: String,
    /// Ids of attached tool documents.
    pub tool_ids: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// An agent bound to a provider, an LLM, and its executable tools.
pub struct MemAgent {
    document: AgentDocument,
    provider: Arc<dyn MemoryProvider>,
    llm: Box<dyn LLMClient>,
    attached: Vec<ToolDocument>,
    registry: ToolRegistry,
}

impl MemAgent {
    /// Create a fresh, unsaved agent.
    pub fn new(
        provider: Arc<dyn MemoryProvider>,
        llm: Box<dyn LLMClient>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            document: AgentDocument {
                id: Uuid::new_v4().to_string(),
                instruction: instruction.into(),
                tool_ids: Vec::new(),
                created_at: Utc::now(),
            },
            provider,
            llm,
            attached: Vec::new(),
            registry: ToolRegistry::new(),
        }
    }

    /// Persist the agent document (insert or replace).
    pub async fn save(&self) -> Result<()> {
        let value = serde_json::to_value(&self.document)
            .map_err(|e| AppError::Internal(format!("agent document encode failed: {}", e)))?;
        self.provider.store(RecordKind::Agent, value).await?;
        tracing::info!(agent = %self.document.id, "saved agent");
        Ok(())
    }

    /// Rehydrate a persisted agent.
    ///
    /// Attached tool documents are loaded from the provider; executables are
    /// bound from `registry` by name. A stored tool whose document or
    /// executable has gone missing is skipped with a warning.
    pub async fn load(
        provider: Arc<dyn MemoryProvider>,
        llm: Box<dyn LLMClient>,
        registry: &ToolRegistry,
        id: &str,
    ) -> Result<Self> {
        let value = provider
            .retrieve_by_id(RecordKind::Agent, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no agent with id {}", id)))?;
        let document: AgentDocument = serde_json::from_value(value)
            .map_err(|e| AppError::Storage(format!("stored agent document is malformed: {}", e)))?;

        let mut agent = Self {
            document: document.clone(),
            provider,
            llm,
            attached: Vec::new(),
            registry: ToolRegistry::new(),
        };

        for tool_id in &document.tool_ids {
            let stored = agent
                .provider
                .retrieve_by_id(RecordKind::Tool, tool_id)
                .await?;
            let Some(stored) = stored else {
                tracing::warn!(agent = %document.id, tool_id = %tool_id, "attached tool document is gone, skipping");
                continue;
            };
            let tool_document: ToolDocument = serde_json::from_value(stored).map_err(|e| {
                AppError::Storage(format!("stored tool document is malformed: {}", e))
            })?;

            // bind the runnable pieces; the persisted tool_ids list stays as stored
            match registry.get(&tool_document.name) {
                Some(exec) => {
                    agent.registry.register(exec);
                    agent.attached.push(tool_document);
                }
                None => {
                    tracing::warn!(
                        agent = %document.id,
                        tool = %tool_document.name,
                        "no executable registered for attached tool, skipping"
                    );
                }
            }
        }

        Ok(agent)
    }

    /// Attach one stored tool together with its executable.
    ///
    /// Attaching an already-attached id is a no-op.
    pub fn attach_tool(&mut self, document: ToolDocument, exec: Arc<dyn Tool>) {
        if self.document.tool_ids.contains(&document.id) {
            return;
        }
        self.document.tool_ids.push(document.id.clone());
        self.registry.register(exec);
        self.attached.push(document);
    }

    /// Attach every stored tool whose executable exists in `registry`.
    ///
    /// Returns how many tools were attached.
    pub async fn attach_toolbox(
        &mut self,
        toolbox: &Toolbox,
        registry: &ToolRegistry,
    ) -> Result<usize> {
        let mut attached = 0;
        for document in toolbox.list_tools().await? {
            match registry.get(&document.name) {
                Some(exec) => {
                    self.attach_tool(document, exec);
                    attached += 1;
                }
                None => {
                    tracing::warn!(
                        tool = %document.name,
                        "no executable registered for stored tool, skipping"
                    );
                }
            }
        }
        Ok(attached)
    }

    /// Run the agent against a natural-language instruction.
    ///
    /// Requested tool calls are executed through the agent's registry; a
    /// failing tool becomes an error payload the model sees rather than an
    /// aborted run. Stops when the model answers without tool calls, or
    /// after a fixed number of round-trips (the last content wins).
    pub async fn run(&self, query: &str) -> Result<String> {
        let tools: Vec<ToolDefinition> = self
            .attached
            .iter()
            .map(|document| ToolDefinition {
                name: document.name.clone(),
                description: document.description.clone(),
                parameters: document.parameters.clone(),
            })
            .collect();

        let mut messages = vec![
            ConversationMessage::system(&self.document.instruction),
            ConversationMessage::user(query),
        ];

        for iteration in 0..MAX_TOOL_ITERATIONS {
            let response = self.llm.generate_with_tools(&messages, &tools).await?;
            messages.push(ConversationMessage::assistant(
                &response.content,
                response.tool_calls.clone(),
            ));

            if response.tool_calls.is_empty() {
                return Ok(response.content);
            }

            tracing::debug!(
                agent = %self.document.id,
                iteration,
                calls = response.tool_calls.len(),
                "executing tool calls"
            );

            for call in &response.tool_calls {
                let result = match self
                    .registry
                    .execute(&call.name, call.arguments.clone())
                    .await
                {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "tool execution failed");
                        serde_json::json!({ "error": e.to_string() })
                    }
                };
                messages.push(ConversationMessage::tool_result(&call.id, &result));
            }
        }

        tracing::warn!(agent = %self.document.id, "run hit the iteration cap");
        Ok(messages
            .iter()
            .rev()
            .find(|m| m.role == crate::llm::MessageRole::Assistant)
            .map(|m| m.content.clone())
            .unwrap_or_default())
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn instruction(&self) -> &str {
        &self.document.instruction
    }

    pub fn tool_ids(&self) -> &[String] {
        &self.document.tool_ids
    }

    pub fn attached_tools(&self) -> &[ToolDocument] {
        &self.attached
    }
}
