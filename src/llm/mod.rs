//! LLM client implementations.
//!
//! A single trait abstracts the chat API the engine needs: plain
//! generation, system-prompted generation, and multi-message generation
//! with function tools. OpenAI is the one wired-up provider.

pub mod client;
pub mod openai;

pub use client::{ConversationMessage, LLMClient, LLMResponse, MessageRole, Provider};
pub use openai::OpenAIClient;
