//! Storage abstraction for persisted engine records
//!
//! This module provides the `MemoryProvider` trait that abstracts over the
//! storage backends (MongoDB, in-memory). Documents are plain JSON objects
//! keyed by a string `_id` field, grouped per [`RecordKind`].
//!
//! # Example
//!
//! ```rust,ignore
//! use memora::db::{MemoryProvider, ProviderConfig};
//!
//! // In-memory provider (default for development/testing)
//! let provider = ProviderConfig::Memory.connect().await?;
//!
//! // MongoDB-backed provider
//! let provider = ProviderConfig::MongoDb {
//!     uri: "mongodb://localhost:27017".into(),
//!     database: "memora".into(),
//! }
//! .connect()
//! .await?;
//! ```

use crate::types::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Classes of documents the engine persists, one collection each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Registered tool documents with their embeddings.
    Tool,
    /// Persisted agents.
    Agent,
}

impl RecordKind {
    /// Collection (or bucket) name backing this record class.
    pub fn collection_name(&self) -> &'static str {
        match self {
            RecordKind::Tool => "toolbox",
            RecordKind::Agent => "agents",
        }
    }
}

/// Storage provider configuration
#[derive(Debug, Clone, Default)]
pub enum ProviderConfig {
    /// In-memory storage (ephemeral, lost on exit)
    #[default]
    Memory,
    /// MongoDB-backed storage
    MongoDb {
        /// Connection URI (e.g. `mongodb://localhost:27017`)
        uri: String,
        /// Database name
        database: String,
    },
}

impl ProviderConfig {
    /// Connect a provider from this configuration
    pub async fn connect(&self) -> Result<Arc<dyn MemoryProvider>> {
        match self {
            ProviderConfig::Memory => Ok(Arc::new(super::memory::InMemoryProvider::new())),
            ProviderConfig::MongoDb { uri, database } => {
                let provider = super::mongo::MongoProvider::connect(uri, database).await?;
                Ok(Arc::new(provider))
            }
        }
    }

    /// Create from environment variables or fall back to in-memory
    pub fn from_env() -> Self {
        if let Ok(uri) = std::env::var("MONGODB_URI") {
            if !uri.is_empty() {
                let database = std::env::var("MONGODB_DATABASE")
                    .unwrap_or_else(|_| "memora".to_string());
                return ProviderConfig::MongoDb { uri, database };
            }
        }

        ProviderConfig::Memory
    }
}

/// Abstract trait for document storage
///
/// Documents are JSON objects carrying a string `_id` and, for named
/// records, a `name` field. `store` has insert-or-replace semantics keyed
/// by `_id`.
#[async_trait]
pub trait MemoryProvider: Send + Sync {
    /// Insert or replace a document keyed by its `_id` field; returns the id
    async fn store(&self, kind: RecordKind, document: Value) -> Result<String>;

    /// Fetch a document by id
    async fn retrieve_by_id(&self, kind: RecordKind, id: &str) -> Result<Option<Value>>;

    /// Fetch a document by its `name` field
    async fn retrieve_by_name(&self, kind: RecordKind, name: &str) -> Result<Option<Value>>;

    /// Replace the document with the given id; unknown id is an error
    async fn update_by_id(&self, kind: RecordKind, id: &str, document: Value) -> Result<()>;

    /// Delete by id; returns whether a document was removed
    async fn delete_by_id(&self, kind: RecordKind, id: &str) -> Result<bool>;

    /// Delete by `name`; returns whether a document was removed
    async fn delete_by_name(&self, kind: RecordKind, name: &str) -> Result<bool>;

    /// Remove every document of this kind; returns how many went away
    async fn delete_all(&self, kind: RecordKind) -> Result<u64>;

    /// All documents of this kind, in storage order
    async fn list_all(&self, kind: RecordKind) -> Result<Vec<Value>>;
}

/// Pull the `_id` string out of a document, or fail.
pub(crate) fn document_id(document: &Value) -> Result<String> {
    document
        .get("_id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| {
            crate::types::AppError::InvalidInput(
                "document must carry a string _id field".to_string(),
            )
        })
}
