//! Core abstractions for a generic CRUD layer over a JSON document store.
//!
//! This crate is the heart of the crudlayer project and provides:
//!
//! - **Items** ([`item`]) - The trait every stored record implements
//! - **Match compilation** ([`matching`]) - Typed per-field match criteria compiled into filters
//! - **Filter expressions** ([`query`]) - A backend-neutral filter AST and its visitor
//! - **Search pipelines** ([`pipeline`]) - Accumulates filters, sort keys, skip and limit into one search
//! - **Pagination** ([`page`]) - Page results and page arithmetic
//! - **Collection schemas** ([`schema`]) - Field rules and indexes a collection is created with
//! - **Store backend abstraction** ([`backend`]) - The trait storage backends implement
//! - **Base model** ([`model`]) - Generic insert/read/update/delete/search for one item type
//! - **Error handling** ([`error`]) - Store errors and the domain error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use crudlayer_core::{item::Item, matching::MatchOption, model::{BaseModel, BaseSearchOptions}};
//! use crudlayer_core::pipeline::{SearchPipelineBuilder, SortKey};
//!
//! let books = BaseModel::<Book, _>::new(backend, 10)?;
//! let page = books
//!     .search(BaseSearchOptions::new(
//!         1,
//!         SearchPipelineBuilder::new()
//!             .sorted_by(vec![SortKey::asc("title")])?
//!             .match_field("title", &MatchOption::partial("rust"))?,
//!     ))
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as crudlayer_core;

pub mod backend;
pub mod error;
pub mod item;
pub mod matching;
pub mod model;
pub mod page;
pub mod pipeline;
pub mod query;
pub mod schema;
