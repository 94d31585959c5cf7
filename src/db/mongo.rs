//! MongoDB storage provider
//!
//! [`MemoryProvider`] over the official `mongodb` driver. One collection per
//! [`RecordKind`] inside the configured database; documents round-trip
//! between JSON values and BSON via serde.

use crate::db::traits::{document_id, MemoryProvider, RecordKind};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::{Client, Database};
use serde_json::Value;

pub struct MongoProvider {
    database: Database,
}

impl MongoProvider {
    /// Connect from a MongoDB connection URI and database name.
    pub async fn connect(uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| AppError::Storage(format!("MongoDB connection failed: {}", e)))?;

        Ok(Self {
            database: client.database(database),
        })
    }

    fn collection(&self, kind: RecordKind) -> mongodb::Collection<Document> {
        self.database.collection(kind.collection_name())
    }
}

fn to_bson_document(value: &Value) -> Result<Document> {
    bson::to_document(value)
        .map_err(|e| AppError::Storage(format!("document encode failed: {}", e)))
}

fn from_bson_document(document: Document) -> Result<Value> {
    bson::from_document(document)
        .map_err(|e| AppError::Storage(format!("document decode failed: {}", e)))
}

#[async_trait]
impl MemoryProvider for MongoProvider {
    async fn store(&self, kind: RecordKind, document: Value) -> Result<String> {
        let id = document_id(&document)?;
        let replacement = to_bson_document(&document)?;

        self.collection(kind)
            .replace_one(doc! { "_id": &id }, replacement)
            .upsert(true)
            .await
            .map_err(|e| AppError::Storage(format!("store failed: {}", e)))?;

        Ok(id)
    }

    async fn retrieve_by_id(&self, kind: RecordKind, id: &str) -> Result<Option<Value>> {
        let found = self
            .collection(kind)
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Storage(format!("lookup failed: {}", e)))?;

        found.map(from_bson_document).transpose()
    }

    async fn retrieve_by_name(&self, kind: RecordKind, name: &str) -> Result<Option<Value>> {
        let found = self
            .collection(kind)
            .find_one(doc! { "name": name })
            .await
            .map_err(|e| AppError::Storage(format!("lookup failed: {}", e)))?;

        found.map(from_bson_document).transpose()
    }

    async fn update_by_id(&self, kind: RecordKind, id: &str, document: Value) -> Result<()> {
        let replacement = to_bson_document(&document)?;
        let outcome = self
            .collection(kind)
            .replace_one(doc! { "_id": id }, replacement)
            .await
            .map_err(|e| AppError::Storage(format!("update failed: {}", e)))?;

        if outcome.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "no {} record with id {}",
                kind.collection_name(),
                id
            )));
        }
        Ok(())
    }

    async fn delete_by_id(&self, kind: RecordKind, id: &str) -> Result<bool> {
        let outcome = self
            .collection(kind)
            .delete_one(doc! { "_id": id })
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {}", e)))?;

        Ok(outcome.deleted_count > 0)
    }

    async fn delete_by_name(&self, kind: RecordKind, name: &str) -> Result<bool> {
        let outcome = self
            .collection(kind)
            .delete_many(doc! { "name": name })
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {}", e)))?;

        Ok(outcome.deleted_count > 0)
    }

    async fn delete_all(&self, kind: RecordKind) -> Result<u64> {
        let outcome = self
            .collection(kind)
            .delete_many(doc! {})
            .await
            .map_err(|e| AppError::Storage(format!("delete failed: {}", e)))?;

        Ok(outcome.deleted_count)
    }

    async fn list_all(&self, kind: RecordKind) -> Result<Vec<Value>> {
        let cursor = self
            .collection(kind)
            .find(doc! {})
            .await
            .map_err(|e| AppError::Storage(format!("list failed: {}", e)))?;

        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| AppError::Storage(format!("list failed: {}", e)))?;

        documents.into_iter().map(from_bson_document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_bson_round_trip() {
        let doc = json!({
            "_id": "abc",
            "name": "get_weather",
            "embedding": [0.25, -0.5],
            "parameters": { "type": "object" }
        });

        let bson_doc = to_bson_document(&doc).unwrap();
        let back = from_bson_document(bson_doc).unwrap();
        assert_eq!(back["_id"], "abc");
        assert_eq!(back["embedding"][1], -0.5);
    }
}
