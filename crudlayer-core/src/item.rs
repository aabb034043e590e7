//! The [`Item`] trait implemented by every stored resource.
//!
//! An item is identified by a caller-chosen string key stored under its own field name
//! (`book_id`, `user_id`, ...), not by a store-generated id.
//!
//! # Example
//!
//! ```ignore
//! use crudlayer::item::Item;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Book {
//!     pub book_id: String,
//!     pub title: String,
//! }
//!
//! impl Item for Book {
//!     fn id(&self) -> &str {
//!         &self.book_id
//!     }
//!
//!     fn id_key() -> &'static str {
//!         "book_id"
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "books_info"
//!     }
//! }
//! ```

use bson::{Document, deserialize_from_document, serialize_to_document};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::StoreResult;

pub trait Item: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Returns this item's key.
    fn id(&self) -> &str;

    /// Name of the field holding the key.
    fn id_key() -> &'static str;

    /// Name of the collection items of this type live in.
    fn collection_name() -> &'static str;
}

/// Document conversions, implemented for every [`Item`].
pub trait ItemExt: Item {
    fn to_document(&self) -> StoreResult<Document>;

    fn from_document(document: Document) -> StoreResult<Self>;
}

impl<T: Item> ItemExt for T {
    fn to_document(&self) -> StoreResult<Document> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: Document) -> StoreResult<Self> {
        Ok(deserialize_from_document(document)?)
    }
}
