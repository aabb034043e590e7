//! In-memory storage implementation.
//!
//! Collections are vectors of BSON documents kept in insertion order behind an async
//! read-write lock. A collection ensured with a [`CollectionSchema`] validates every
//! written document against it and enforces its unique indexes, so writes fail the same
//! way they would against MongoDB.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;

use crudlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    pipeline::{AggregatedPage, SearchPipeline},
    query::Expr,
    schema::CollectionSchema,
};

use crate::evaluator::{DocumentEvaluator, compare_documents};

#[derive(Debug, Default)]
struct CollectionState {
    schema: Option<CollectionSchema>,
    documents: Vec<Document>,
}

impl CollectionState {
    /// Position of the first document matching `filter`.
    fn position(&self, filter: &Expr) -> StoreResult<Option<usize>> {
        for (index, document) in self.documents.iter().enumerate() {
            if DocumentEvaluator::matches(document, filter)? {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }

    /// Checks `document` against the schema, ignoring the document at `replacing`.
    fn check_write(
        &self,
        collection: &str,
        document: &Document,
        replacing: Option<usize>,
    ) -> StoreResult<()> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };

        schema
            .validate(document)
            .map_err(|detail| StoreError::DocumentRejected {
                collection: collection.to_string(),
                detail,
            })?;

        for index in schema.unique_indexes() {
            let key = index_key(document, &index.keys);
            let conflict = self
                .documents
                .iter()
                .enumerate()
                .filter(|(position, _)| Some(*position) != replacing)
                .any(|(_, existing)| index_key(existing, &index.keys) == key);

            if conflict {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    detail: format!("index {} dup key {:?}", index.name, key),
                });
            }
        }

        Ok(())
    }
}

/// Values of `keys` in `document`, with missing fields indexed as null.
fn index_key(document: &Document, keys: &[String]) -> Vec<Bson> {
    keys.iter()
        .map(|key| document.get(key).cloned().unwrap_or(Bson::Null))
        .collect()
}

type StoreMap = HashMap<String, CollectionState>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones
/// share the same data.
///
/// Searches scan every document of the collection. Intended for development and tests.
///
/// # Example
///
/// ```ignore
/// use crudlayer_memory::InMemoryStore;
/// use crudlayer::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// store.insert_document(doc! { "user_id": "user_1" }, "users").await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> collection state
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(|state| state.documents.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn ensure_collection(&self, schema: &CollectionSchema) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let state = store.entry(schema.name.clone()).or_default();

        state.schema = Some(schema.clone());

        Ok(())
    }

    async fn insert_document(&self, document: Document, collection: &str) -> StoreResult<()> {
        let mut store = self.store.write().await;
        let state = store.entry(collection.to_string()).or_default();

        state.check_write(collection, &document, None)?;
        state.documents.push(document);

        Ok(())
    }

    async fn find_document(
        &self,
        filter: &Expr,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(state) = store.get(collection) else {
            return Ok(None);
        };

        Ok(state
            .position(filter)?
            .map(|index| state.documents[index].clone()))
    }

    async fn update_document(
        &self,
        filter: &Expr,
        changes: Document,
        collection: &str,
    ) -> StoreResult<bool> {
        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(false);
        };
        let Some(index) = state.position(filter)? else {
            return Ok(false);
        };

        let mut updated = state.documents[index].clone();
        for (key, value) in changes {
            updated.insert(key, value);
        }

        state.check_write(collection, &updated, Some(index))?;
        state.documents[index] = updated;

        Ok(true)
    }

    async fn delete_document(&self, filter: &Expr, collection: &str) -> StoreResult<bool> {
        let mut store = self.store.write().await;
        let Some(state) = store.get_mut(collection) else {
            return Ok(false);
        };

        match state.position(filter)? {
            Some(index) => {
                state.documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn search(
        &self,
        pipeline: &SearchPipeline,
        collection: &str,
    ) -> StoreResult<AggregatedPage> {
        let store = self.store.read().await;
        let Some(state) = store.get(collection) else {
            return Ok(AggregatedPage::default());
        };

        let mut matched = Vec::new();
        for document in &state.documents {
            if DocumentEvaluator::matches(document, &pipeline.filter)? {
                matched.push(document);
            }
        }

        if !pipeline.sort.is_empty() {
            matched.sort_by(|a, b| compare_documents(a, b, &pipeline.sort));
        }

        let total = matched.len() as u64;
        let skip = usize::try_from(pipeline.skip).unwrap_or(usize::MAX);
        let limit = pipeline
            .limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);

        let data: Vec<Document> = matched.into_iter().skip(skip).take(limit).cloned().collect();

        Ok(AggregatedPage {
            count: data.len() as u64,
            total,
            data,
        })
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.store.write().await.remove(name);

        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use crudlayer_memory::InMemoryStore;
/// use crudlayer::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder()
///     .with_schema(books_schema())
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder {
    schemas: Vec<CollectionSchema>,
}

impl InMemoryStoreBuilder {
    /// Ensures `schema` on the built store.
    pub fn with_schema(mut self, schema: CollectionSchema) -> Self {
        self.schemas.push(schema);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        let store = InMemoryStore::new();

        for schema in &self.schemas {
            store.ensure_collection(schema).await?;
        }

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use crudlayer_core::{
        pipeline::{SearchPipelineBuilder, SortKey},
        query::Filter,
        schema::{FieldRule, IndexSpec},
    };

    fn users_schema() -> CollectionSchema {
        CollectionSchema::builder("users")
            .field(FieldRule::string("user_id").non_empty())
            .field(FieldRule::string("email").non_empty())
            .index(IndexSpec::new("user_id_1", ["user_id"]).unique())
            .index(IndexSpec::new("email_1", ["email"]).unique())
            .build()
    }

    async fn store() -> InMemoryStore {
        InMemoryStore::builder()
            .with_schema(users_schema())
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = store().await;
        let user = doc! { "user_id": "user_1", "email": "a@example.com" };

        store.insert_document(user.clone(), "users").await.unwrap();

        let found = store
            .find_document(&Filter::eq("user_id", "user_1"), "users")
            .await
            .unwrap();
        assert_eq!(found, Some(user));
    }

    #[tokio::test]
    async fn unique_index_rejects_duplicates() {
        let store = store().await;
        store
            .insert_document(doc! { "user_id": "user_1", "email": "a@example.com" }, "users")
            .await
            .unwrap();

        let err = store
            .insert_document(doc! { "user_id": "user_2", "email": "a@example.com" }, "users")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(store.len("users").await, 1);
    }

    #[tokio::test]
    async fn schema_rejects_invalid_documents() {
        let store = store().await;

        let err = store
            .insert_document(doc! { "user_id": "user_1" }, "users")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::DocumentRejected { .. }));
    }

    #[tokio::test]
    async fn update_may_not_take_another_documents_key() {
        let store = store().await;
        for (id, email) in [("user_1", "a@example.com"), ("user_2", "b@example.com")] {
            store
                .insert_document(doc! { "user_id": id, "email": email }, "users")
                .await
                .unwrap();
        }

        let err = store
            .update_document(
                &Filter::eq("user_id", "user_2"),
                doc! { "email": "a@example.com" },
                "users",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        let unchanged = store
            .update_document(
                &Filter::eq("user_id", "user_2"),
                doc! { "email": "b@example.com" },
                "users",
            )
            .await
            .unwrap();
        assert!(unchanged);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_documents() {
        let store = store().await;
        let filter = Filter::eq("user_id", "ghost");

        assert!(!store.update_document(&filter, doc! { "email": "x" }, "users").await.unwrap());
        assert!(!store.delete_document(&filter, "users").await.unwrap());
        assert!(!store.delete_document(&filter, "unknown").await.unwrap());
    }

    #[tokio::test]
    async fn search_counts_all_matches_and_returns_window() {
        let store = InMemoryStore::new();
        for title in ["c", "a", "b", "d"] {
            store
                .insert_document(doc! { "title": title }, "books_info")
                .await
                .unwrap();
        }

        let pipeline = SearchPipelineBuilder::new()
            .sorted_by(vec![SortKey::asc("title")])
            .unwrap()
            .skip(1)
            .limit(2)
            .build();
        let page = store.search(&pipeline, "books_info").await.unwrap();

        assert_eq!(page.total, 4);
        assert_eq!(page.count, 2);
        assert_eq!(page.data, vec![doc! { "title": "b" }, doc! { "title": "c" }]);
    }

    #[tokio::test]
    async fn search_of_missing_collection_is_empty() {
        let store = InMemoryStore::new();
        let page = store
            .search(&SearchPipelineBuilder::new().build(), "books_info")
            .await
            .unwrap();

        assert_eq!(page, AggregatedPage::default());
    }
}
