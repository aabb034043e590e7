//! Users, stored in the `users` collection and keyed by `user_id`.
//!
//! Besides the key, `username`, `account_name` and `email` are each unique. Passwords
//! are stored as given.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crudlayer::prelude::*;

use super::{CrudResource, require_non_empty, require_non_empty_if_present};

pub const COLLECTION: &str = "users";
pub const ID_KEY: &str = "user_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub password: String,
    pub account_name: String,
    pub email: String,
}

impl Item for User {
    fn id(&self) -> &str {
        &self.user_id
    }

    fn id_key() -> &'static str {
        ID_KEY
    }

    fn collection_name() -> &'static str {
        COLLECTION
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserSearchOptions {
    #[serde(default)]
    pub current_page: i64,
    /// Exact user id. An empty string does not filter.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<MatchOption>,
    #[serde(default)]
    pub account_name: Option<MatchOption>,
    #[serde(default)]
    pub email: Option<MatchOption>,
}

impl UserSearchOptions {
    pub fn page(current_page: i64) -> Self {
        Self {
            current_page,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct UsersModel<B> {
    base: BaseModel<User, B>,
}

impl<B: StoreBackend> UsersModel<B> {
    pub fn new(backend: B, page_size: u64) -> CrudResult<Self> {
        Ok(Self {
            base: BaseModel::new(backend, page_size)?,
        })
    }

    pub fn schema() -> CollectionSchema {
        let field = |name: &str, description: &str| {
            FieldRule::string(name).non_empty().description(description)
        };

        CollectionSchema::builder(COLLECTION)
            .field(field(ID_KEY, "User ID must not be empty"))
            .field(field("username", "Username must not be empty"))
            .field(field("password", "Password must not be empty"))
            .field(field("account_name", "Account name must not be empty"))
            .field(field("email", "Email must not be empty"))
            .index(IndexSpec::new("user_id_1", [ID_KEY]).unique())
            .index(IndexSpec::new("username_1", ["username"]).unique())
            .index(IndexSpec::new("account_name_1", ["account_name"]).unique())
            .index(IndexSpec::new("email_1", ["email"]).unique())
            .build()
    }

    pub async fn init(&self) -> CrudResult<()> {
        self.base.ensure_collection(&Self::schema()).await
    }

    pub fn base(&self) -> &BaseModel<User, B> {
        &self.base
    }

    /// Stores a new user, failing with `DataAlreadyInUsed` when any unique field is taken.
    pub async fn insert(&self, user: &User) -> CrudResult<()> {
        require_non_empty(ID_KEY, &user.user_id)?;
        require_non_empty("username", &user.username)?;
        require_non_empty("password", &user.password)?;
        require_non_empty("account_name", &user.account_name)?;
        require_non_empty("email", &user.email)?;

        let taken = Filter::or([
            Filter::eq(ID_KEY, user.user_id.as_str()),
            Filter::eq("username", user.username.as_str()),
            Filter::eq("account_name", user.account_name.as_str()),
            Filter::eq("email", user.email.as_str()),
        ]);
        if self.base.exists(&taken).await? {
            tracing::debug!(user_id = %user.user_id, "user data already in use");
            return Err(CrudError::DataAlreadyInUsed);
        }

        self.base.insert(user).await
    }

    pub async fn get_by_id(&self, user_id: &str) -> CrudResult<User> {
        self.base.get_by_id(user_id).await
    }

    pub async fn update(&self, patch: &UserUpdate) -> CrudResult<()> {
        require_non_empty(ID_KEY, &patch.user_id)?;
        require_non_empty_if_present("username", patch.username.as_deref())?;
        require_non_empty_if_present("password", patch.password.as_deref())?;
        require_non_empty_if_present("account_name", patch.account_name.as_deref())?;
        require_non_empty_if_present("email", patch.email.as_deref())?;

        self.base.update(&patch.user_id, patch).await
    }

    pub async fn delete(&self, user_id: &str) -> CrudResult<()> {
        self.base.delete(user_id).await
    }

    /// Searches users ordered by user id.
    pub async fn search(&self, options: &UserSearchOptions) -> CrudResult<PaginationData<User>> {
        let mut builder =
            SearchPipelineBuilder::new().sorted_by(vec![SortKey::asc(ID_KEY)])?;

        if let Some(user_id) = options.user_id.as_deref().filter(|id| !id.is_empty()) {
            builder = builder.match_field(ID_KEY, &MatchOption::equal(user_id))?;
        }
        for (field, option) in [
            ("username", &options.username),
            ("account_name", &options.account_name),
            ("email", &options.email),
        ] {
            if let Some(option) = option {
                builder = builder.match_field(field, option)?;
            }
        }

        self.base
            .search(BaseSearchOptions::new(options.current_page, builder))
            .await
    }
}

#[async_trait]
impl<B: StoreBackend + 'static> CrudResource for UsersModel<B> {
    type Item = User;
    type Update = UserUpdate;
    type SearchOptions = UserSearchOptions;

    fn name(&self) -> &'static str {
        "users"
    }

    async fn insert(&self, item: User) -> CrudResult<()> {
        UsersModel::insert(self, &item).await
    }

    async fn read_one(&self, id: &str) -> CrudResult<User> {
        self.get_by_id(id).await
    }

    async fn read(&self, options: UserSearchOptions) -> CrudResult<PaginationData<User>> {
        self.search(&options).await
    }

    async fn update(&self, patch: UserUpdate) -> CrudResult<()> {
        UsersModel::update(self, &patch).await
    }

    async fn delete(&self, id: &str) -> CrudResult<()> {
        UsersModel::delete(self, id).await
    }
}
