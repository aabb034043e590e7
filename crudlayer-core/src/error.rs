//! Error types and result types for store and model operations.
//!
//! Two layers of errors exist:
//!
//! - [`StoreError`] is what a [`StoreBackend`](crate::backend::StoreBackend) reports.
//! - [`CrudError`] is the domain taxonomy surfaced by models. Every variant carries a
//!   stable numeric [`code`](CrudError::code) and [`name`](CrudError::name) so callers
//!   can report it without matching on message text.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

use crate::matching::MatchKind;

/// Represents all errors a storage backend can report.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A write would violate a unique index of the collection.
    #[error("Duplicate key in collection {collection}: {detail}")]
    DuplicateKey { collection: String, detail: String },
    /// The collection validator rejected the written document.
    #[error("Document rejected by collection {collection}: {detail}")]
    DocumentRejected { collection: String, detail: String },
    /// The document has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub const UNKNOWN_ERROR_CODE: u32 = 100_001;
pub const CURRENT_PAGE_INVALID_CODE: u32 = 200_001;
pub const OBJECT_ID_NOT_FOUND_CODE: u32 = 200_002;
pub const DUPLICATED_OBJECT_ID_CODE: u32 = 200_003;
pub const MATCH_TYPE_INVALID_CODE: u32 = 200_004;
pub const SORT_LIST_INVALID_CODE: u32 = 200_005;
pub const MATCH_KEY_DUPLICATED_CODE: u32 = 200_006;
pub const MATCH_VALUE_INVALID_CODE: u32 = 200_007;
pub const DATA_ALREADY_IN_USED_CODE: u32 = 200_008;
pub const DATA_VALIDATION_FAILED_CODE: u32 = 200_009;

/// Who an error is attributable to, which decides how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller sent something unusable.
    Client,
    /// The addressed item does not exist.
    NotFound,
    /// The server failed or was misused internally.
    Internal,
}

/// Domain errors returned by models.
#[derive(Error, Debug)]
pub enum CrudError {
    /// The requested page number is below 1.
    #[error("Current page can be only positive integer")]
    CurrentPageInvalid,
    /// No item has the given ID.
    #[error("Item with ID {0} is not exist")]
    ObjectIdNotFound(String),
    /// An item with the given ID already exists.
    #[error("Item ID {0} is already used")]
    DuplicatedObjectId(String),
    /// The match type code is not one of the supported kinds.
    #[error("Match type {0} is invalid or unsupported")]
    MatchTypeInvalid(i64),
    /// A sort list was empty or repeated a key.
    #[error("Sort list is invalid: {0}")]
    SortListInvalid(String),
    /// A field received a second match predicate.
    #[error("Match key {0} is duplicated")]
    MatchKeyDuplicated(String),
    /// The match value has the wrong shape for its match kind.
    #[error("Given match value's type {value_type} is invalid or unsupported in match type {kind}")]
    MatchValueInvalid { value_type: &'static str, kind: MatchKind },
    /// Data that must be unique is already used by another item.
    #[error("Given data is already in used")]
    DataAlreadyInUsed,
    /// The given data failed validation.
    #[error("Given data is invalid or cannot be used: {0}")]
    DataValidationFailed(String),
    /// A model was constructed with unusable settings.
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    /// Any backend failure not translated into a domain error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A specialized `Result` type for model operations.
pub type CrudResult<T> = Result<T, CrudError>;

impl CrudError {
    /// Stable numeric code of this error.
    pub fn code(&self) -> u32 {
        match self {
            CrudError::CurrentPageInvalid => CURRENT_PAGE_INVALID_CODE,
            CrudError::ObjectIdNotFound(_) => OBJECT_ID_NOT_FOUND_CODE,
            CrudError::DuplicatedObjectId(_) => DUPLICATED_OBJECT_ID_CODE,
            CrudError::MatchTypeInvalid(_) => MATCH_TYPE_INVALID_CODE,
            CrudError::SortListInvalid(_) => SORT_LIST_INVALID_CODE,
            CrudError::MatchKeyDuplicated(_) => MATCH_KEY_DUPLICATED_CODE,
            CrudError::MatchValueInvalid { .. } => MATCH_VALUE_INVALID_CODE,
            CrudError::DataAlreadyInUsed => DATA_ALREADY_IN_USED_CODE,
            CrudError::DataValidationFailed(_) => DATA_VALIDATION_FAILED_CODE,
            CrudError::Configuration(_) | CrudError::Store(_) => UNKNOWN_ERROR_CODE,
        }
    }

    /// Stable name of this error.
    pub fn name(&self) -> &'static str {
        match self {
            CrudError::CurrentPageInvalid => "CurrentPageInvalid",
            CrudError::ObjectIdNotFound(_) => "ObjectIDNotFound",
            CrudError::DuplicatedObjectId(_) => "DuplicatedObjectID",
            CrudError::MatchTypeInvalid(_) => "MatchTypeInvalid",
            CrudError::SortListInvalid(_) => "SortListInvalid",
            CrudError::MatchKeyDuplicated(_) => "MatchKeyDuplicated",
            CrudError::MatchValueInvalid { .. } => "MatchValueInvalid",
            CrudError::DataAlreadyInUsed => "DataAlreadyInUsed",
            CrudError::DataValidationFailed(_) => "DataValidationFailed",
            CrudError::Configuration(_) | CrudError::Store(_) => "UnknownError",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            CrudError::ObjectIdNotFound(_) => ErrorClass::NotFound,
            CrudError::CurrentPageInvalid
            | CrudError::DuplicatedObjectId(_)
            | CrudError::MatchTypeInvalid(_)
            | CrudError::MatchValueInvalid { .. }
            | CrudError::DataAlreadyInUsed
            | CrudError::DataValidationFailed(_) => ErrorClass::Client,
            CrudError::SortListInvalid(_)
            | CrudError::MatchKeyDuplicated(_)
            | CrudError::Configuration(_)
            | CrudError::Store(_) => ErrorClass::Internal,
        }
    }

    /// Human readable message, with unclassified errors wrapped the way they are reported.
    pub fn message(&self) -> String {
        match self {
            CrudError::Configuration(_) | CrudError::Store(_) => {
                format!("unexpected error: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(CrudError::CurrentPageInvalid.code(), 200_001);
        assert_eq!(CrudError::ObjectIdNotFound("x".into()).code(), 200_002);
        assert_eq!(CrudError::DataValidationFailed("x".into()).code(), 200_009);
        assert_eq!(
            CrudError::Store(StoreError::Backend("boom".into())).code(),
            UNKNOWN_ERROR_CODE
        );
    }

    #[test]
    fn not_found_is_its_own_class() {
        assert_eq!(
            CrudError::ObjectIdNotFound("book_0".into()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(CrudError::DataAlreadyInUsed.class(), ErrorClass::Client);
        assert_eq!(
            CrudError::MatchKeyDuplicated("title".into()).class(),
            ErrorClass::Internal
        );
    }

    #[test]
    fn store_errors_are_reported_as_unknown() {
        let error = CrudError::from(StoreError::Backend("connection reset".into()));

        assert_eq!(error.name(), "UnknownError");
        assert_eq!(
            error.message(),
            "unexpected error: Backend error: connection reset"
        );
    }

    #[test]
    fn match_value_message_names_kind() {
        let error = CrudError::MatchValueInvalid {
            value_type: "list",
            kind: MatchKind::Partial,
        };

        assert_eq!(
            error.to_string(),
            "Given match value's type list is invalid or unsupported in match type Partial"
        );
    }
}
