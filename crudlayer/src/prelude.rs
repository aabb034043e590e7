//! Convenient re-exports of commonly used types from crudlayer.
//!
//! ```ignore
//! use crudlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The item trait and its document conversions
//! - Store backends and builders
//! - Filters, match options and search pipelines
//! - The base model and pagination
//! - Collection schemas and error types

pub use crudlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{CrudError, CrudResult, ErrorClass, StoreError, StoreResult},
    item::{Item, ItemExt},
    matching::{MatchKind, MatchOption, MatchValue},
    model::{BaseModel, BaseSearchOptions, DEFAULT_PAGE_SIZE},
    page::PaginationData,
    pipeline::{AggregatedPage, SearchPipeline, SearchPipelineBuilder, SortDirection, SortKey},
    query::{Expr, FieldOp, Filter, QueryVisitor},
    schema::{CollectionSchema, FieldRule, FieldType, IndexSpec},
};
