//! Wires settings, the document store and the resources into one router.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;

use crudlayer::{
    memory::InMemoryStore,
    mongodb::MongoDbStoreBuilder,
    prelude::{StoreBackend, StoreBackendBuilder},
};

use crate::{
    api::{RouterBuilder, crud_routes},
    resources::{BooksModel, CrudResource, UsersModel},
    settings::{MongoDbSettings, Settings, StoreKind},
};

pub type SharedStore = Arc<dyn StoreBackend>;

/// Opens the configured document store.
pub async fn connect_store(settings: &Settings) -> anyhow::Result<SharedStore> {
    match settings.store.backend {
        StoreKind::MongoDb => {
            let store = mongodb_builder(&settings.mongodb)
                .build()
                .await
                .with_context(|| {
                    format!(
                        "failed to connect to mongodb at {}:{}",
                        settings.mongodb.host, settings.mongodb.port
                    )
                })?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => {
            tracing::warn!("using the in-memory store, data is lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

fn mongodb_builder(settings: &MongoDbSettings) -> MongoDbStoreBuilder {
    MongoDbStoreBuilder::from_host(&settings.host, settings.port, &settings.database)
        .credentials(settings.user.clone(), settings.password.clone())
        .timeout(Duration::from_millis(settings.timeout_ms))
}

/// Ensures both collections and builds the HTTP router serving them.
pub async fn build_app<B>(backend: B, settings: &Settings) -> anyhow::Result<Router>
where
    B: StoreBackend + Clone + 'static,
{
    let page_size = settings.search.page_size;

    let books = BooksModel::new(backend.clone(), page_size)?;
    books
        .init()
        .await
        .with_context(|| "failed to prepare the books collection")?;

    let users = UsersModel::new(backend, page_size)?;
    users
        .init()
        .await
        .with_context(|| "failed to prepare the users collection")?;

    Ok(RouterBuilder::new()
        .mount_module(books.name(), crud_routes(Arc::new(books)))
        .mount_module(users.name(), crud_routes(Arc::new(users)))
        .with_tracing()
        .with_request_id()
        .with_timeout(settings.server.request_timeout_ms)
        .build())
}
