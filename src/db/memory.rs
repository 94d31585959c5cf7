//! In-memory storage provider
//!
//! Ephemeral `HashMap`-backed implementation of [`MemoryProvider`], used by
//! the test suite and for offline demo runs without a MongoDB instance.

use crate::db::traits::{document_id, MemoryProvider, RecordKind};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryProvider {
    records: RwLock<HashMap<RecordKind, Vec<(String, Value)>>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_of(document: &Value) -> Option<&str> {
    document.get("name").and_then(|v| v.as_str())
}

#[async_trait]
impl MemoryProvider for InMemoryProvider {
    async fn store(&self, kind: RecordKind, document: Value) -> Result<String> {
        let id = document_id(&document)?;
        let mut records = self.records.write();
        let bucket = records.entry(kind).or_default();
        if let Some(slot) = bucket.iter_mut().find(|(existing, _)| *existing == id) {
            slot.1 = document;
        } else {
            bucket.push((id.clone(), document));
        }
        Ok(id)
    }

    async fn retrieve_by_id(&self, kind: RecordKind, id: &str) -> Result<Option<Value>> {
        let records = self.records.read();
        Ok(records
            .get(&kind)
            .and_then(|bucket| bucket.iter().find(|(existing, _)| existing == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn retrieve_by_name(&self, kind: RecordKind, name: &str) -> Result<Option<Value>> {
        let records = self.records.read();
        Ok(records
            .get(&kind)
            .and_then(|bucket| bucket.iter().find(|(_, doc)| name_of(doc) == Some(name)))
            .map(|(_, doc)| doc.clone()))
    }

    async fn update_by_id(&self, kind: RecordKind, id: &str, document: Value) -> Result<()> {
        let mut records = self.records.write();
        let bucket = records.entry(kind).or_default();
        match bucket.iter_mut().find(|(existing, _)| existing == id) {
            Some(slot) => {
                slot.1 = document;
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "no {} record with id {}",
                kind.collection_name(),
                id
            ))),
        }
    }

    async fn delete_by_id(&self, kind: RecordKind, id: &str) -> Result<bool> {
        let mut records = self.records.write();
        let bucket = records.entry(kind).or_default();
        let before = bucket.len();
        bucket.retain(|(existing, _)| existing != id);
        Ok(bucket.len() < before)
    }

    async fn delete_by_name(&self, kind: RecordKind, name: &str) -> Result<bool> {
        let mut records = self.records.write();
        let bucket = records.entry(kind).or_default();
        let before = bucket.len();
        bucket.retain(|(_, doc)| name_of(doc) != Some(name));
        Ok(bucket.len() < before)
    }

    async fn delete_all(&self, kind: RecordKind) -> Result<u64> {
        let mut records = self.records.write();
        let bucket = records.entry(kind).or_default();
        let removed = bucket.len() as u64;
        bucket.clear();
        Ok(removed)
    }

    async fn list_all(&self, kind: RecordKind) -> Result<Vec<Value>> {
        let records = self.records.read();
        Ok(records
            .get(&kind)
            .map(|bucket| bucket.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }
}
