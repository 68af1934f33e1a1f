//! Storage seam behind the CRUD handler groups.
//!
//! Handler groups only talk to [`DocumentStore`]; the bundled
//! [`MemoryStore`] keeps collections in process memory.

use crate::error::{AppError, AppResult};
use crate::models::Document;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use uuid::Uuid;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// List documents in creation order, returning the page and the total count.
    async fn list(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> AppResult<(Vec<Document>, usize)>;

    async fn create(&self, collection: &str, data: Map<String, Value>) -> AppResult<Document>;

    async fn get(&self, collection: &str, id: Uuid) -> AppResult<Document>;

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        data: Map<String, Value>,
    ) -> AppResult<Document>;

    async fn merge(
        &self,
        collection: &str,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> AppResult<Document>;

    async fn delete(&self, collection: &str, id: Uuid) -> AppResult<()>;
}

/// In-memory document store keyed by collection name.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<Uuid, Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(collection: &str, id: Uuid) -> AppError {
        AppError::DocumentNotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    fn update<F>(&self, collection: &str, id: Uuid, apply: F) -> AppResult<Document>
    where
        F: FnOnce(&mut Document),
    {
        let docs = self
            .collections
            .get(collection)
            .ok_or_else(|| Self::not_found(collection, id))?;
        let mut doc = docs
            .get_mut(&id)
            .ok_or_else(|| Self::not_found(collection, id))?;
        apply(doc.value_mut());
        Ok(doc.value().clone())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(
        &self,
        collection: &str,
        limit: usize,
        offset: usize,
    ) -> AppResult<(Vec<Document>, usize)> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok((Vec::new(), 0));
        };

        let mut all: Vec<Document> = docs.iter().map(|entry| entry.value().clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = all.len();
        let page = all.into_iter().skip(offset).take(limit).collect();
        Ok((page, total))
    }

    async fn create(&self, collection: &str, data: Map<String, Value>) -> AppResult<Document> {
        let doc = Document::new(collection, data);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id, doc.clone());

        tracing::debug!(collection = %collection, id = %doc.id, "Document created");
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: Uuid) -> AppResult<Document> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(&id).map(|doc| doc.clone()))
            .ok_or_else(|| Self::not_found(collection, id))
    }

    async fn replace(
        &self,
        collection: &str,
        id: Uuid,
        data: Map<String, Value>,
    ) -> AppResult<Document> {
        self.update(collection, id, |doc| doc.replace(data))
    }

    async fn merge(
        &self,
        collection: &str,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> AppResult<Document> {
        self.update(collection, id, |doc| doc.merge(patch))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> AppResult<()> {
        let removed = self
            .collections
            .get(collection)
            .and_then(|docs| docs.remove(&id));

        match removed {
            Some(_) => {
                tracing::debug!(collection = %collection, id = %id, "Document deleted");
                Ok(())
            }
            None => Err(Self::not_found(collection, id)),
        }
    }
}
