//! Main crudlayer crate providing a generic CRUD layer over document stores.
//!
//! This crate is the primary entry point of the crudlayer framework. It re-exports the
//! core types from the sub-crates and provides access to the storage backends.
//!
//! # Features
//!
//! - **Typed items** - Define records with Serde and a key field
//! - **Typed search** - Per-field match options compiled into one paginated search
//! - **Multiple backends** - In-memory and MongoDB storage behind one trait
//! - **Uniform errors** - Every failure maps to a stable code and name
//!
//! # Quick Start
//!
//! ```ignore
//! use crudlayer::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub user_id: String,
//!     pub username: String,
//! }
//!
//! impl Item for User {
//!     fn id(&self) -> &str { &self.user_id }
//!     fn id_key() -> &'static str { "user_id" }
//!     fn collection_name() -> &'static str { "users" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CrudError> {
//!     let users: BaseModel<User, _> = BaseModel::new(InMemoryStore::new(), 10)?;
//!
//!     users.insert(&User { user_id: "user_1".into(), username: "alice".into() }).await?;
//!
//!     let page = users
//!         .search(BaseSearchOptions::new(
//!             1,
//!             SearchPipelineBuilder::new()
//!                 .sorted_by(vec![SortKey::asc("user_id")])?
//!                 .match_field("username", &MatchOption::starts_with("al"))?,
//!         ))
//!         .await?;
//!
//!     println!("found {} users", page.count);
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory::InMemoryStore`] - always available
//! - `mongodb::MongoDbStore` - requires the `mongodb` feature

pub mod prelude;

pub use crudlayer_core::{backend, error, item, matching, model, page, pipeline, query, schema};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use crudlayer_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use crudlayer_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
