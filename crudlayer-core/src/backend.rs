//! Storage backend abstraction.
//!
//! The [`StoreBackend`] trait is the single seam between models and a concrete document
//! store. Every operation addresses one collection by name and one document by filter,
//! so models never see the store's native query language.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use crudlayer::backend::StoreBackend;
//! use crudlayer::query::Filter;
//! use bson::doc;
//!
//! backend.insert_document(doc! { "book_id": "book_1", "title": "Dune" }, "books_info").await?;
//!
//! let found = backend
//!     .find_document(&Filter::eq("book_id", "book_1"), "books_info")
//!     .await?;
//! ```
//!
//! Backends are shared behind `Arc`, and `Arc<dyn StoreBackend>` is itself a backend, so
//! the concrete store can be chosen at runtime.

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use bson::Document;

use crate::{
    error::StoreResult,
    pipeline::{AggregatedPage, SearchPipeline},
    query::Expr,
    schema::CollectionSchema,
};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks.
///
/// # Error Handling
///
/// Writes that would violate a unique index must fail with
/// [`StoreError::DuplicateKey`](crate::error::StoreError::DuplicateKey), and writes the
/// collection schema rejects with
/// [`StoreError::DocumentRejected`](crate::error::StoreError::DocumentRejected). Models
/// translate both into domain errors.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Creates the collection described by `schema`, or re-applies its validator, and
    /// creates any of its indexes that do not exist yet.
    async fn ensure_collection(&self, schema: &CollectionSchema) -> StoreResult<()>;

    /// Inserts one document.
    async fn insert_document(&self, document: Document, collection: &str) -> StoreResult<()>;

    /// Returns the first document matching `filter`, if any.
    async fn find_document(
        &self,
        filter: &Expr,
        collection: &str,
    ) -> StoreResult<Option<Document>>;

    /// Sets the fields of `changes` on the first document matching `filter`.
    ///
    /// Returns `false` when no document matched.
    async fn update_document(
        &self,
        filter: &Expr,
        changes: Document,
        collection: &str,
    ) -> StoreResult<bool>;

    /// Deletes the first document matching `filter`.
    ///
    /// Returns `false` when no document matched.
    async fn delete_document(&self, filter: &Expr, collection: &str) -> StoreResult<bool>;

    /// Runs a search pipeline, returning the total match count and one window of rows.
    async fn search(
        &self,
        pipeline: &SearchPipeline,
        collection: &str,
    ) -> StoreResult<AggregatedPage>;

    /// Drops a collection and everything in it. Dropping a missing collection succeeds.
    async fn drop_collection(&self, name: &str) -> StoreResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> StoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend + ?Sized,
{
    async fn ensure_collection(&self, schema: &CollectionSchema) -> StoreResult<()> {
        (**self).ensure_collection(schema).await
    }

    async fn insert_document(&self, document: Document, collection: &str) -> StoreResult<()> {
        (**self)
            .insert_document(document, collection)
            .await
    }

    async fn find_document(
        &self,
        filter: &Expr,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        (**self).find_document(filter, collection).await
    }

    async fn update_document(
        &self,
        filter: &Expr,
        changes: Document,
        collection: &str,
    ) -> StoreResult<bool> {
        (**self)
            .update_document(filter, changes, collection)
            .await
    }

    async fn delete_document(&self, filter: &Expr, collection: &str) -> StoreResult<bool> {
        (**self).delete_document(filter, collection).await
    }

    async fn search(
        &self,
        pipeline: &SearchPipeline,
        collection: &str,
    ) -> StoreResult<AggregatedPage> {
        (**self).search(pipeline, collection).await
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        (**self).drop_collection(name).await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    async fn ensure_collection(&self, schema: &CollectionSchema) -> StoreResult<()> {
        (**self).ensure_collection(schema).await
    }

    async fn insert_document(&self, document: Document, collection: &str) -> StoreResult<()> {
        (**self)
            .insert_document(document, collection)
            .await
    }

    async fn find_document(
        &self,
        filter: &Expr,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        (**self).find_document(filter, collection).await
    }

    async fn update_document(
        &self,
        filter: &Expr,
        changes: Document,
        collection: &str,
    ) -> StoreResult<bool> {
        (**self)
            .update_document(filter, changes, collection)
            .await
    }

    async fn delete_document(&self, filter: &Expr, collection: &str) -> StoreResult<bool> {
        (**self).delete_document(filter, collection).await
    }

    async fn search(
        &self,
        pipeline: &SearchPipeline,
        collection: &str,
    ) -> StoreResult<AggregatedPage> {
        (**self).search(pipeline, collection).await
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        (**self).drop_collection(name).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
