//! The generic base model.
//!
//! [`BaseModel`] binds an [`Item`] type to a [`StoreBackend`] and provides the CRUD and
//! search operations every resource shares, translating backend failures into the
//! domain errors of [`CrudError`]. Resource models wrap it and add their own validation
//! and uniqueness pre-checks.
//!
//! # Example
//!
//! ```ignore
//! use crudlayer::prelude::*;
//!
//! let model: BaseModel<Book, _> = BaseModel::new(backend, 10)?;
//! model.insert(&book).await?;
//!
//! let found = model.get_by_id("book_1").await?;
//!
//! let page = model
//!     .search(BaseSearchOptions::new(
//!         1,
//!         SearchPipelineBuilder::new().sorted_by(vec![SortKey::asc("title")])?,
//!     ))
//!     .await?;
//! ```

use std::marker::PhantomData;

use bson::{Bson, Document, serialize_to_document};
use serde::Serialize;

use crate::{
    backend::StoreBackend,
    error::{CrudError, CrudResult, StoreError},
    item::{Item, ItemExt},
    page::PaginationData,
    pipeline::SearchPipelineBuilder,
    query::{Expr, Filter},
    schema::CollectionSchema,
};

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// A search request as seen by the base model: which page to return and the
/// predicates and sort order to apply. The window is set by the model.
#[derive(Debug, Clone)]
pub struct BaseSearchOptions {
    pub current_page: i64,
    pub builder: SearchPipelineBuilder,
}

impl BaseSearchOptions {
    pub fn new(current_page: i64, builder: SearchPipelineBuilder) -> Self {
        Self {
            current_page,
            builder,
        }
    }
}

#[derive(Debug)]
pub struct BaseModel<T, B> {
    backend: B,
    page_size: u64,
    _item: PhantomData<fn() -> T>,
}

impl<T, B> Clone for BaseModel<T, B>
where
    B: Clone,
{
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            page_size: self.page_size,
            _item: PhantomData,
        }
    }
}

impl<T, B> BaseModel<T, B>
where
    T: Item,
    B: StoreBackend,
{
    /// Creates a model returning `page_size` rows per search page.
    ///
    /// Fails with `Configuration` when `page_size` is zero.
    pub fn new(backend: B, page_size: u64) -> CrudResult<Self> {
        if page_size < 1 {
            return Err(CrudError::Configuration(format!(
                "page size of {} must be at least 1",
                T::collection_name()
            )));
        }

        Ok(Self {
            backend,
            page_size,
            _item: PhantomData,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn collection(&self) -> &'static str {
        T::collection_name()
    }

    /// Filter selecting the item with key `id`.
    pub fn id_filter(id: &str) -> Expr {
        Filter::eq(T::id_key(), id)
    }

    /// Applies `schema` to the backing collection.
    pub async fn ensure_collection(&self, schema: &CollectionSchema) -> CrudResult<()> {
        tracing::info!(collection = %schema.name, "ensuring collection");
        self.backend.ensure_collection(schema).await?;
        Ok(())
    }

    /// Stores a new item.
    ///
    /// Fails with `DuplicatedObjectId` when the store reports a uniqueness violation.
    pub async fn insert(&self, item: &T) -> CrudResult<()> {
        let document = item.to_document()?;

        tracing::debug!(collection = self.collection(), id = item.id(), "inserting item");
        self.backend
            .insert_document(document, self.collection())
            .await
            .map_err(|err| {
                translate_write_error(err, || CrudError::DuplicatedObjectId(item.id().to_string()))
            })
    }

    /// Returns the item with key `id`, or `ObjectIdNotFound`.
    pub async fn get_by_id(&self, id: &str) -> CrudResult<T> {
        self.find_one(&Self::id_filter(id))
            .await?
            .ok_or_else(|| CrudError::ObjectIdNotFound(id.to_string()))
    }

    /// Returns the first item matching `filter`.
    pub async fn find_one(&self, filter: &Expr) -> CrudResult<Option<T>> {
        let document = self
            .backend
            .find_document(filter, self.collection())
            .await?;

        document
            .map(|document| T::from_document(document).map_err(CrudError::from))
            .transpose()
    }

    /// Whether any item matches `filter`.
    pub async fn exists(&self, filter: &Expr) -> CrudResult<bool> {
        Ok(self
            .backend
            .find_document(filter, self.collection())
            .await?
            .is_some())
    }

    /// Merges the present fields of `patch` into the item with key `id`.
    ///
    /// Fields serialized as null are left unchanged, and the key itself is never
    /// rewritten. Fails with `ObjectIdNotFound` when no such item exists and with
    /// `DataAlreadyInUsed` when the merge would violate a unique index.
    pub async fn update<P>(&self, id: &str, patch: &P) -> CrudResult<()>
    where
        P: Serialize + ?Sized,
    {
        let changes = patch_changes(patch, T::id_key())?;
        let filter = Self::id_filter(id);

        if changes.is_empty() {
            return match self.exists(&filter).await? {
                true => Ok(()),
                false => Err(CrudError::ObjectIdNotFound(id.to_string())),
            };
        }

        tracing::debug!(
            collection = self.collection(),
            id,
            fields = ?changes.keys().collect::<Vec<_>>(),
            "updating item"
        );
        let updated = self
            .backend
            .update_document(&filter, changes, self.collection())
            .await
            .map_err(|err| translate_write_error(err, || CrudError::DataAlreadyInUsed))?;

        match updated {
            true => Ok(()),
            false => Err(CrudError::ObjectIdNotFound(id.to_string())),
        }
    }

    /// Removes the item with key `id`, or fails with `ObjectIdNotFound`.
    pub async fn delete(&self, id: &str) -> CrudResult<()> {
        tracing::debug!(collection = self.collection(), id, "deleting item");
        let deleted = self
            .backend
            .delete_document(&Self::id_filter(id), self.collection())
            .await?;

        match deleted {
            true => Ok(()),
            false => Err(CrudError::ObjectIdNotFound(id.to_string())),
        }
    }

    /// Returns page `options.current_page` of the items matched by `options.builder`.
    ///
    /// Fails with `CurrentPageInvalid` when the page is below 1. Pages past the last
    /// one are empty but still report the total count.
    pub async fn search(&self, options: BaseSearchOptions) -> CrudResult<PaginationData<T>> {
        let page = u64::try_from(options.current_page)
            .ok()
            .filter(|page| *page >= 1)
            .ok_or(CrudError::CurrentPageInvalid)?;

        let pipeline = options
            .builder
            .skip((page - 1).saturating_mul(self.page_size))
            .limit(self.page_size)
            .build();

        let result = self.backend.search(&pipeline, self.collection()).await?;
        tracing::debug!(
            collection = self.collection(),
            page,
            total = result.total,
            returned = result.count,
            "searched items"
        );

        let data = result
            .data
            .into_iter()
            .map(T::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PaginationData::new(page, self.page_size, result.total, data))
    }
}

/// Serializes `patch` into the fields to set, dropping nulls and the key field.
fn patch_changes<P>(patch: &P, id_key: &str) -> CrudResult<Document>
where
    P: Serialize + ?Sized,
{
    let document = serialize_to_document(patch).map_err(StoreError::from)?;

    Ok(document
        .into_iter()
        .filter(|(key, value)| key != id_key && !matches!(value, Bson::Null))
        .collect())
}

fn translate_write_error(err: StoreError, on_duplicate: impl FnOnce() -> CrudError) -> CrudError {
    match err {
        StoreError::DuplicateKey { collection, detail } => {
            tracing::debug!(%collection, %detail, "write rejected by unique index");
            on_duplicate()
        }
        StoreError::DocumentRejected { detail, .. } => CrudError::DataValidationFailed(detail),
        other => CrudError::Store(other),
    }
}
