//! In-memory storage backend for crudlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for
//! development and tests.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Schema enforcement** - Ensured collections validate writes and enforce unique indexes
//! - **Full search support** - Filters, multi-key sorting, skip and limit
//!
//! # Quick Start
//!
//! ```ignore
//! use crudlayer::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let books: BaseModel<Book, _> = BaseModel::new(backend, 10)?;
//!
//!     books.insert(&book).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as crudlayer_memory;

pub mod evaluator;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
