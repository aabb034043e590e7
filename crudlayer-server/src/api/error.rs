//! Error handling for the HTTP layer

use axum::{
    BoxError, Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tower::timeout::error::Elapsed;

use crudlayer::{
    error::UNKNOWN_ERROR_CODE,
    prelude::{CrudError, ErrorClass},
};

/// Body of every response: either `{"result": ..}` or `{"error": ..}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope<T> {
    Result(T),
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: u32,
    pub name: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Status {
    pub status: &'static str,
}

impl Status {
    pub const OK: Status = Status { status: "OK" };
}

/// Reported when a request outlives the configured timeout.
pub const REQUEST_TIMEOUT_CODE: u32 = 100_002;

/// Errors a handler or a router layer can return.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Crud(#[from] CrudError),

    #[error(transparent)]
    Rejection(#[from] JsonRejection),

    #[error("request timed out")]
    Timeout,

    /// A router layer failed for a reason other than the timeout.
    #[error("unexpected error: {0}")]
    Layer(String),
}

/// Turns errors from the router's fallible layers into enveloped responses.
pub(crate) async fn handle_layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Layer(err.to_string())
    }
}

fn status_of(class: ErrorClass) -> StatusCode {
    match class {
        ErrorClass::NotFound => StatusCode::NOT_FOUND,
        ErrorClass::Client => StatusCode::BAD_REQUEST,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Status and body reported for this failure. Undecodable bodies are validation failures.
    fn into_parts(self) -> (StatusCode, ErrorBody) {
        let err = match self {
            ApiError::Crud(err) => err,
            ApiError::Rejection(rejection) => CrudError::DataValidationFailed(rejection.body_text()),
            ApiError::Timeout => {
                return (
                    StatusCode::REQUEST_TIMEOUT,
                    ErrorBody {
                        code: REQUEST_TIMEOUT_CODE,
                        name: "RequestTimeout",
                        message: ApiError::Timeout.to_string(),
                    },
                );
            }
            ApiError::Layer(message) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: UNKNOWN_ERROR_CODE,
                        name: "UnknownError",
                        message: format!("unexpected error: {message}"),
                    },
                );
            }
        };

        (
            status_of(err.class()),
            ErrorBody {
                code: err.code(),
                name: err.name(),
                message: err.message(),
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, mut body) = self.into_parts();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(
                error_code = body.code,
                error_name = body.name,
                status_code = status.as_u16(),
                error = %body.message,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_code = body.code,
                error_name = body.name,
                status_code = status.as_u16(),
                "request rejected"
            );
        }

        if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR {
            body.message = "An internal server error occurred".to_string();
        }

        (status, Json(Envelope::<()>::Error(body))).into_response()
    }
}
