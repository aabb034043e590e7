//! Generic CRUD handlers, mounted once per resource.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};

use crudlayer::prelude::{CrudError, Item, PaginationData};

use super::error::{ApiError, Envelope, Status};
use crate::resources::CrudResource;

/// Builds the routes of one resource, to be nested under `/api/{name}`.
///
/// | verb | path | success |
/// |---|---|---|
/// | POST | `/` | 201 `{"result":{"status":"OK"}}` |
/// | GET | `/{id}` | 200 `{"result": item}` |
/// | GET | `/` | 200 `{"result": page}` |
/// | PUT | `/` | 204 |
/// | DELETE | `/` | 204 |
pub fn crud_routes<R: CrudResource>(resource: Arc<R>) -> Router {
    Router::new()
        .route(
            "/",
            get(read::<R>)
                .post(insert::<R>)
                .put(update::<R>)
                .delete(delete::<R>),
        )
        .route("/{id}", get(read_one::<R>))
        .with_state(resource)
}

async fn insert<R: CrudResource>(
    State(resource): State<Arc<R>>,
    body: Result<Json<R::Item>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Status>>), ApiError> {
    let Json(item) = body?;
    resource.insert(item).await?;

    Ok((StatusCode::CREATED, Json(Envelope::Result(Status::OK))))
}

async fn read_one<R: CrudResource>(
    State(resource): State<Arc<R>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<R::Item>>, ApiError> {
    let item = resource.read_one(&id).await?;

    Ok(Json(Envelope::Result(item)))
}

async fn read<R: CrudResource>(
    State(resource): State<Arc<R>>,
    body: Result<Json<R::SearchOptions>, JsonRejection>,
) -> Result<Json<Envelope<PaginationData<R::Item>>>, ApiError> {
    let Json(options) = body?;
    let page = resource.read(options).await?;

    Ok(Json(Envelope::Result(page)))
}

async fn update<R: CrudResource>(
    State(resource): State<Arc<R>>,
    body: Result<Json<R::Update>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(patch) = body?;
    resource.update(patch).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes the item named by the key field of the JSON body.
async fn delete<R: CrudResource>(
    State(resource): State<Arc<R>>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body?;
    let id_key = R::Item::id_key();
    let id = body
        .get(id_key)
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| CrudError::DataValidationFailed(format!("{id_key} must not be empty")))?;

    resource.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
