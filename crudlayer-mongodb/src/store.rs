use std::time::Duration;

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, Credential, ServerAddress, ServerApi, ServerApiVersion, ValidationLevel},
};

use crudlayer_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{StoreError, StoreResult},
    pipeline::{AggregatedPage, SearchPipeline},
    query::Expr,
    schema::CollectionSchema,
};

use crate::{
    pipeline::render_pipeline,
    query::MongoQueryTranslator,
    schema::{render_indexes, render_validator},
};

/// Server error code for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;
/// Server error code for documents failing the collection validator.
const DOCUMENT_VALIDATION_FAILURE_CODE: i32 = 121;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn restore_document(document: Document) -> Document {
        document
            .into_iter()
            .filter(|(k, _)| k != "_id")
            .collect()
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

fn error_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

/// Maps a driver error from a write on `collection` to a [`StoreError`].
fn write_error(err: MongoError, collection: &str) -> StoreError {
    match error_code(&err) {
        Some(DUPLICATE_KEY_CODE) => StoreError::DuplicateKey {
            collection: collection.to_string(),
            detail: err.to_string(),
        },
        Some(DOCUMENT_VALIDATION_FAILURE_CODE) => StoreError::DocumentRejected {
            collection: collection.to_string(),
            detail: err.to_string(),
        },
        _ => StoreError::Backend(err.to_string()),
    }
}

fn count_field(document: &Document, key: &str) -> u64 {
    match document.get(key) {
        Some(Bson::Int32(value)) => u64::try_from(*value).unwrap_or(0),
        Some(Bson::Int64(value)) => u64::try_from(*value).unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn ensure_collection(&self, schema: &CollectionSchema) -> StoreResult<()> {
        let database = self.client.database(&self.database);
        let validator = render_validator(schema);

        let existing = database
            .list_collection_names()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if existing.iter().any(|name| name == &schema.name) {
            database
                .run_command(doc! {
                    "collMod": schema.name.clone(),
                    "validator": validator,
                    "validationLevel": "strict",
                })
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        } else {
            database
                .create_collection(&schema.name)
                .validator(validator)
                .validation_level(ValidationLevel::Strict)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }

        let collection = self.get_collection(&schema.name);
        let index_names = collection
            .list_index_names()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        for model in render_indexes(schema) {
            let name = model
                .options
                .as_ref()
                .and_then(|options| options.name.clone())
                .unwrap_or_default();

            if index_names.contains(&name) {
                continue;
            }

            tracing::info!(collection = %schema.name, index = %name, "creating index");
            collection
                .create_index(model)
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }

        Ok(())
    }

    async fn insert_document(&self, document: Document, collection: &str) -> StoreResult<()> {
        self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| write_error(e, collection))?;

        Ok(())
    }

    async fn find_document(
        &self,
        filter: &Expr,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .get_collection(collection)
            .find_one(MongoQueryTranslator::translate(filter)?)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .map(Self::restore_document))
    }

    async fn update_document(
        &self,
        filter: &Expr,
        changes: Document,
        collection: &str,
    ) -> StoreResult<bool> {
        Ok(self
            .get_collection(collection)
            .find_one_and_update(
                MongoQueryTranslator::translate(filter)?,
                doc! { "$set": changes },
            )
            .await
            .map_err(|e| write_error(e, collection))?
            .is_some())
    }

    async fn delete_document(&self, filter: &Expr, collection: &str) -> StoreResult<bool> {
        Ok(self
            .get_collection(collection)
            .find_one_and_delete(MongoQueryTranslator::translate(filter)?)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .is_some())
    }

    async fn search(
        &self,
        pipeline: &SearchPipeline,
        collection: &str,
    ) -> StoreResult<AggregatedPage> {
        let stages = render_pipeline(pipeline)?;

        let result = self
            .get_collection(collection)
            .aggregate(stages)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?
            .try_next()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let Some(result) = result else {
            return Ok(AggregatedPage::default());
        };

        let data = match result.get("data") {
            Some(Bson::Array(rows)) => rows
                .iter()
                .map(|row| match row {
                    Bson::Document(document) => Ok(Self::restore_document(document.clone())),
                    other => Err(StoreError::InvalidDocument(format!(
                        "expected a document in search results, got {other}"
                    ))),
                })
                .collect::<StoreResult<Vec<Document>>>()?,
            _ => Vec::new(),
        };

        Ok(AggregatedPage {
            count: count_field(&result, "count"),
            total: count_field(&result, "total"),
            data,
        })
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.shutdown().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Dsn(String),
    Host { host: String, port: u16 },
}

/// Connects a [`MongoDbStore`], either from a connection string or from a host and port.
///
/// Credentials are only applied when both a user and a password are given. The
/// connection is verified with a `ping` before the store is returned.
///
/// ```ignore
/// let store = MongoDbStoreBuilder::from_host("localhost", 27017, "library")
///     .credentials("root", "secret")
///     .timeout(Duration::from_secs(3))
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    target: Target,
    database: String,
    user: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            target: Target::Dsn(dsn.to_string()),
            database: database.to_string(),
            user: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_host(host: &str, port: u16, database: &str) -> Self {
        Self {
            target: Target::Host {
                host: host.to_string(),
                port,
            },
            ..Self::new("", database)
        }
    }

    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn client_options(&self) -> StoreResult<ClientOptions> {
        let mut options = match &self.target {
            Target::Dsn(dsn) => ClientOptions::parse(dsn)
                .await
                .map_err(|e| StoreError::Initialization(e.to_string()))?,
            Target::Host { host, port } => {
                let mut options = ClientOptions::parse("mongodb://localhost")
                    .await
                    .map_err(|e| StoreError::Initialization(e.to_string()))?;
                options.hosts = vec![ServerAddress::Tcp {
                    host: host.clone(),
                    port: Some(*port),
                }];
                options
            }
        };

        let user = self.user.as_deref().filter(|user| !user.is_empty());
        let password = self.password.as_deref().filter(|password| !password.is_empty());
        if let (Some(user), Some(password)) = (user, password) {
            options.credential = Some(
                Credential::builder()
                    .username(user.to_string())
                    .password(password.to_string())
                    .build(),
            );
        }

        options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
        options.connect_timeout = Some(self.timeout);
        options.server_selection_timeout = Some(self.timeout);

        Ok(options)
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> StoreResult<Self::Backend> {
        let client = Client::with_options(self.client_options().await?)
            .map_err(|e| StoreError::Initialization(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Initialization(e.to_string()))?;

        tracing::info!(database = %self.database, "connected to mongodb");
        Ok(MongoDbStore::new(client, self.database))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn host_target_sets_address_and_timeouts() {
        let options = MongoDbStoreBuilder::from_host("db.internal", 27018, "library")
            .timeout(Duration::from_secs(5))
            .client_options()
            .await
            .unwrap();

        assert_eq!(
            options.hosts,
            vec![ServerAddress::Tcp {
                host: "db.internal".to_string(),
                port: Some(27018),
            }]
        );
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(5)));
        assert!(options.credential.is_none());
    }

    #[tokio::test]
    async fn credentials_require_user_and_password() {
        let partial = MongoDbStoreBuilder::from_host("localhost", 27017, "library")
            .credentials("root", "")
            .client_options()
            .await
            .unwrap();
        assert!(partial.credential.is_none());

        let full = MongoDbStoreBuilder::from_host("localhost", 27017, "library")
            .credentials("root", "secret")
            .client_options()
            .await
            .unwrap();
        let credential = full.credential.unwrap();
        assert_eq!(credential.username.as_deref(), Some("root"));
    }

    #[test]
    fn restore_strips_object_id() {
        let document = MongoDbStore::restore_document(doc! { "_id": 1, "user_id": "user_1" });

        assert_eq!(document, doc! { "user_id": "user_1" });
    }

    #[test]
    fn reads_counts_of_either_width() {
        let result = doc! { "count": 2_i32, "total": 7_i64 };

        assert_eq!(count_field(&result, "count"), 2);
        assert_eq!(count_field(&result, "total"), 7);
        assert_eq!(count_field(&result, "missing"), 0);
    }
}
