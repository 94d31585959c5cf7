//! Agent behavior: attaching tools, persistence, and the tool-calling run
//! loop driven by a scripted LLM.

mod common;

use async_trait::async_trait;
use common::{KeywordEmbedder, ScriptedLLM};
use memora::agents::{MemAgent, DEFAULT_INSTRUCTION};
use memora::db::{InMemoryProvider, MemoryProvider};
use memora::llm::{ConversationMessage, LLMClient, LLMResponse, MessageRole};
use memora::toolbox::Toolbox;
use memora::tools::{Tool, ToolRegistry, WeatherTool};
use memora::types::{AppError, Result};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingQuoteTool {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for CountingQuoteTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }
    fn description(&self) -> &str {
        "Fetch the latest trade price for a stock ticker symbol"
    }
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "symbol": { "type": "string" } },
            "required": ["symbol"]
        })
    }
    async fn execute(&self, args: Value) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let symbol = args["symbol"].as_str().unwrap_or("?").to_uppercase();
        Ok(json!({ "result": format!("The current price of {} is 111.00 USD.", symbol) }))
    }
}

struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }
    fn description(&self) -> &str {
        "always fails"
    }
    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    async fn execute(&self, _: Value) -> Result<Value> {
        Err(AppError::Tool("quote source unreachable".to_string()))
    }
}

async fn agent_with_tool(
    llm: Arc<ScriptedLLM>,
    exec: Arc<dyn Tool>,
) -> (MemAgent, Arc<dyn MemoryProvider>) {
    let provider: Arc<dyn MemoryProvider> = Arc::new(InMemoryProvider::new());
    let toolbox = Toolbox::new(provider.clone(), Arc::new(KeywordEmbedder));
    let document = toolbox.register_tool(exec.as_ref(), false).await.unwrap();

    let mut agent = MemAgent::new(provider.clone(), Box::new(SharedLLM(llm)), DEFAULT_INSTRUCTION);
    agent.attach_tool(document, exec);
    (agent, provider)
}

/// Box-compatible wrapper so tests can keep a handle on the scripted LLM.
struct SharedLLM(Arc<ScriptedLLM>);

#[async_trait]
impl LLMClient for SharedLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.0.generate(prompt).await
    }
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.0.generate_with_system(system, prompt).await
    }
    async fn generate_with_tools(
        &self,
        messages: &[ConversationMessage],
        tools: &[memora::types::ToolDefinition],
    ) -> Result<LLMResponse> {
        self.0.generate_with_tools(messages, tools).await
    }
    fn model_name(&self) -> &str {
        self.0.model_name()
    }
}

#[tokio::test]
async fn run_executes_requested_tool_and_returns_final_answer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let llm = Arc::new(ScriptedLLM::new(vec![
        ScriptedLLM::tool_call("call_1", "get_stock_price", json!({"symbol": "aapl"})),
        ScriptedLLM::text("AAPL is trading at 111.00 USD."),
    ]));

    let (agent, _provider) = agent_with_tool(
        llm.clone(),
        Arc::new(CountingQuoteTool {
            calls: calls.clone(),
        }),
    )
    .await;

    let answer = agent.run("What does AAPL trade at?").await.unwrap();

    assert_eq!(answer, "AAPL is trading at 111.00 USD.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(llm.calls_made(), 2);

    // the second round saw the tool result
    let seen = llm.seen.lock();
    let second_round = &seen[1];
    let tool_message = second_round
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .expect("tool result should be in the conversation");
    assert!(tool_message.content.contains("111.00"));
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
}

#[tokio::test]
async fn run_without_tool_calls_returns_content_directly() {
    let calls = Arc::new(AtomicUsize::new(0));
    let llm = Arc::new(ScriptedLLM::new(vec![ScriptedLLM::text("Hello!")]));

    let (agent, _provider) = agent_with_tool(
        llm.clone(),
        Arc::new(CountingQuoteTool {
            calls: calls.clone(),
        }),
    )
    .await;

    let answer = agent.run("Say hello").await.unwrap();

    assert_eq!(answer, "Hello!");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(llm.calls_made(), 1);
}

#[tokio::test]
async fn failing_tool_surfaces_as_error_payload_not_a_crash() {
    let llm = Arc::new(ScriptedLLM::new(vec![
        ScriptedLLM::tool_call("call_1", "get_stock_price", json!({"symbol": "AAPL"})),
        ScriptedLLM::text("I could not reach the quote source."),
    ]));

    let (agent, _provider) = agent_with_tool(llm.clone(), Arc::new(FailingTool)).await;

    let answer = agent.run("What does AAPL trade at?").await.unwrap();
    assert_eq!(answer, "I could not reach the quote source.");

    let seen = llm.seen.lock();
    let tool_message = seen[1]
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .expect("tool result should be in the conversation");
    assert!(tool_message.content.contains("error"));
    assert!(tool_message.content.contains("quote source unreachable"));
}

#[tokio::test]
async fn run_stops_at_the_iteration_cap() {
    // a model that never stops asking for tools
    let responses: Vec<_> = (0..50)
        .map(|i| {
            ScriptedLLM::tool_call(
                &format!("call_{}", i),
                "get_stock_price",
                json!({"symbol": "AAPL"}),
            )
        })
        .collect();
    let llm = Arc::new(ScriptedLLM::new(responses));

    let calls = Arc::new(AtomicUsize::new(0));
    let (agent, _provider) = agent_with_tool(
        llm.clone(),
        Arc::new(CountingQuoteTool {
            calls: calls.clone(),
        }),
    )
    .await;

    let answer = agent.run("loop forever").await.unwrap();

    assert_eq!(llm.calls_made(), 10);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert_eq!(answer, "");
}

#[tokio::test]
async fn attach_toolbox_skips_tools_without_executables() {
    let provider: Arc<dyn MemoryProvider> = Arc::new(InMemoryProvider::new());
    let toolbox = Toolbox::new(provider.clone(), Arc::new(KeywordEmbedder));

    toolbox
        .register_tool(&WeatherTool::new(), false)
        .await
        .unwrap();
    toolbox
        .register_tool(
            &CountingQuoteTool {
                calls: Arc::new(AtomicUsize::new(0)),
            },
            false,
        )
        .await
        .unwrap();

    // registry only knows the weather tool
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WeatherTool::new()));

    let llm = Arc::new(ScriptedLLM::new(vec![]));
    let mut agent = MemAgent::new(provider, Box::new(SharedLLM(llm)), DEFAULT_INSTRUCTION);

    let attached = agent.attach_toolbox(&toolbox, &registry).await.unwrap();
    assert_eq!(attached, 1);
    assert_eq!(agent.attached_tools().len(), 1);
    assert_eq!(agent.attached_tools()[0].name, "get_weather");
}

#[tokio::test]
async fn saved_agent_can_be_loaded_and_run() {
    let provider: Arc<dyn MemoryProvider> = Arc::new(InMemoryProvider::new());
    let toolbox = Toolbox::new(provider.clone(), Arc::new(KeywordEmbedder));

    let calls = Arc::new(AtomicUsize::new(0));
    let exec: Arc<dyn Tool> = Arc::new(CountingQuoteTool {
        calls: calls.clone(),
    });
    let document = toolbox.register_tool(exec.as_ref(), false).await.unwrap();

    let create_llm = Arc::new(ScriptedLLM::new(vec![]));
    let mut agent = MemAgent::new(
        provider.clone(),
        Box::new(SharedLLM(create_llm)),
        "You answer market questions.",
    );
    agent.attach_tool(document, exec.clone());
    agent.save().await.unwrap();
    let agent_id = agent.id().to_string();

    let mut registry = ToolRegistry::new();
    registry.register(exec);

    let run_llm = Arc::new(ScriptedLLM::new(vec![
        ScriptedLLM::tool_call("call_1", "get_stock_price", json!({"symbol": "NVDA"})),
        ScriptedLLM::text("NVDA is at 111.00 USD."),
    ]));
    let loaded = MemAgent::load(
        provider,
        Box::new(SharedLLM(run_llm)),
        &registry,
        &agent_id,
    )
    .await
    .unwrap();

    assert_eq!(loaded.instruction(), "You answer market questions.");
    let answer = loaded.run("How is NVDA doing?").await.unwrap();
    assert_eq!(answer, "NVDA is at 111.00 USD.");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
