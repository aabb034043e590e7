//! MongoDB backend implementation for crudlayer.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait.
//! Filters become native query documents, searches run as a single
//! `$match`/`$facet`/`$project` aggregation, and collection schemas are applied as strict
//! `$jsonSchema` validators with named indexes.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! crudlayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use crudlayer::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "library")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as crudlayer_mongodb;

pub mod pipeline;
pub mod query;
pub mod schema;
pub mod store;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
