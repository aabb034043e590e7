//! Resource models served over HTTP.
//!
//! Each resource wraps a [`BaseModel`](crudlayer::model::BaseModel) with its own field
//! validation, uniqueness pre-checks, search options and sort order, and exposes the
//! result through [`CrudResource`] so one set of HTTP handlers serves all of them.

pub mod books;
pub mod users;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crudlayer::prelude::{CrudError, CrudResult, Item, PaginationData};

pub use books::{Book, BookSearchOptions, BookUpdate, BooksModel};
pub use users::{User, UserSearchOptions, UserUpdate, UsersModel};

/// The operations the HTTP layer needs from a resource.
#[async_trait]
pub trait CrudResource: Send + Sync + 'static {
    type Item: Item;
    type Update: DeserializeOwned + Send + 'static;
    type SearchOptions: DeserializeOwned + Send + 'static;

    /// Route segment the resource is mounted under, as in `/api/{name}`.
    fn name(&self) -> &'static str;

    async fn insert(&self, item: Self::Item) -> CrudResult<()>;

    async fn read_one(&self, id: &str) -> CrudResult<Self::Item>;

    async fn read(&self, options: Self::SearchOptions) -> CrudResult<PaginationData<Self::Item>>;

    async fn update(&self, patch: Self::Update) -> CrudResult<()>;

    async fn delete(&self, id: &str) -> CrudResult<()>;
}

/// Fails with `DataValidationFailed` when `value` is empty.
pub(crate) fn require_non_empty(field: &str, value: &str) -> CrudResult<()> {
    if value.is_empty() {
        return Err(CrudError::DataValidationFailed(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// Like [`require_non_empty`], for a patch field that may be absent.
pub(crate) fn require_non_empty_if_present(field: &str, value: Option<&str>) -> CrudResult<()> {
    value.map_or(Ok(()), |value| require_non_empty(field, value))
}
