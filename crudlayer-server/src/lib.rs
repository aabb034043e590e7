//! HTTP service exposing books and users over a document store.
//!
//! Each resource is served under `/api/{name}`:
//!
//! ```text
//! POST   /api/books        insert a book
//! GET    /api/books/{id}   read one book
//! GET    /api/books        search books (JSON body with match options)
//! PUT    /api/books        partially update a book
//! DELETE /api/books        delete the book named in the body
//! ```

pub mod api;
pub mod app;
pub mod resources;
pub mod settings;
pub mod telemetry;

pub use app::{build_app, connect_store};
pub use settings::Settings;
