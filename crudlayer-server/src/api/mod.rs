//! HTTP surface: one generic set of CRUD handlers mounted per resource.

mod crud;
mod error;
mod router;

#[cfg(test)]
mod tests;

pub use crud::crud_routes;
pub use error::{ApiError, Envelope, ErrorBody, Status};
pub use router::{MakeRequestUuidV7, RouterBuilder};
