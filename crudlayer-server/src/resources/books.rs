//! Books, stored in the `books_info` collection and keyed by `book_id`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crudlayer::prelude::*;

use super::{CrudResource, require_non_empty, require_non_empty_if_present};

pub const COLLECTION: &str = "books_info";
pub const ID_KEY: &str = "book_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    /// Required, but may be empty.
    pub categories: Vec<String>,
}

impl Item for Book {
    fn id(&self) -> &str {
        &self.book_id
    }

    fn id_key() -> &'static str {
        ID_KEY
    }

    fn collection_name() -> &'static str {
        COLLECTION
    }
}

/// Partial update of a book. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub book_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl From<Book> for BookUpdate {
    fn from(book: Book) -> Self {
        BookUpdate {
            book_id: book.book_id,
            title: Some(book.title),
            author: Some(book.author),
            description: Some(book.description),
            categories: Some(book.categories),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookSearchOptions {
    #[serde(default)]
    pub current_page: i64,
    #[serde(default)]
    pub title: Option<MatchOption>,
    #[serde(default)]
    pub author: Option<MatchOption>,
    /// Matches books sharing at least one category. An empty list does not filter.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

impl BookSearchOptions {
    pub fn page(current_page: i64) -> Self {
        Self {
            current_page,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct BooksModel<B> {
    base: BaseModel<Book, B>,
}

impl<B: StoreBackend> BooksModel<B> {
    pub fn new(backend: B, page_size: u64) -> CrudResult<Self> {
        Ok(Self {
            base: BaseModel::new(backend, page_size)?,
        })
    }

    pub fn schema() -> CollectionSchema {
        CollectionSchema::builder(COLLECTION)
            .field(
                FieldRule::string(ID_KEY)
                    .non_empty()
                    .description("Book ID must not be empty"),
            )
            .field(
                FieldRule::string("title")
                    .non_empty()
                    .description("Title must not be empty"),
            )
            .field(
                FieldRule::string("author")
                    .non_empty()
                    .description("Author must not be empty"),
            )
            .field(
                FieldRule::string("description")
                    .non_empty()
                    .description("Description must not be empty"),
            )
            .field(
                FieldRule::string_array("categories")
                    .unique_items()
                    .description("Categories must contain unique string elements"),
            )
            .index(IndexSpec::new("title_1_author_1", ["title", "author"]))
            .index(IndexSpec::new("book_id_1", [ID_KEY]).unique())
            .build()
    }

    /// Creates or updates the collection validator and indexes.
    pub async fn init(&self) -> CrudResult<()> {
        self.base.ensure_collection(&Self::schema()).await
    }

    pub fn base(&self) -> &BaseModel<Book, B> {
        &self.base
    }

    /// Stores a new book.
    ///
    /// Fails with `DataAlreadyInUsed` when the ID, or the title and author pair, is taken.
    pub async fn insert(&self, book: &Book) -> CrudResult<()> {
        require_non_empty(ID_KEY, &book.book_id)?;
        require_non_empty("title", &book.title)?;
        require_non_empty("author", &book.author)?;
        require_non_empty("description", &book.description)?;

        let taken = Filter::or([
            Filter::eq(ID_KEY, book.book_id.as_str()),
            Filter::and([
                Filter::eq("title", book.title.as_str()),
                Filter::eq("author", book.author.as_str()),
            ]),
        ]);
        if self.base.exists(&taken).await? {
            tracing::debug!(book_id = %book.book_id, "book data already in use");
            return Err(CrudError::DataAlreadyInUsed);
        }

        self.base.insert(book).await
    }

    pub async fn get_by_id(&self, book_id: &str) -> CrudResult<Book> {
        self.base.get_by_id(book_id).await
    }

    pub async fn update(&self, patch: &BookUpdate) -> CrudResult<()> {
        require_non_empty(ID_KEY, &patch.book_id)?;
        require_non_empty_if_present("title", patch.title.as_deref())?;
        require_non_empty_if_present("author", patch.author.as_deref())?;
        require_non_empty_if_present("description", patch.description.as_deref())?;

        self.base.update(&patch.book_id, patch).await
    }

    pub async fn delete(&self, book_id: &str) -> CrudResult<()> {
        self.base.delete(book_id).await
    }

    /// Searches books ordered by title, then author.
    pub async fn search(&self, options: &BookSearchOptions) -> CrudResult<PaginationData<Book>> {
        let mut builder = SearchPipelineBuilder::new()
            .sorted_by(vec![SortKey::asc("title"), SortKey::asc("author")])?;

        if let Some(title) = &options.title {
            builder = builder.match_field("title", title)?;
        }
        if let Some(author) = &options.author {
            builder = builder.match_field("author", author)?;
        }
        if let Some(categories) = options.categories.as_ref().filter(|c| !c.is_empty()) {
            builder =
                builder.match_field("categories", &MatchOption::contains_in(categories.iter().cloned()))?;
        }

        self.base
            .search(BaseSearchOptions::new(options.current_page, builder))
            .await
    }
}

#[async_trait]
impl<B: StoreBackend + 'static> CrudResource for BooksModel<B> {
    type Item = Book;
    type Update = BookUpdate;
    type SearchOptions = BookSearchOptions;

    fn name(&self) -> &'static str {
        "books"
    }

    async fn insert(&self, item: Book) -> CrudResult<()> {
        BooksModel::insert(self, &item).await
    }

    async fn read_one(&self, id: &str) -> CrudResult<Book> {
        self.get_by_id(id).await
    }

    async fn read(&self, options: BookSearchOptions) -> CrudResult<PaginationData<Book>> {
        self.search(&options).await
    }

    async fn update(&self, patch: BookUpdate) -> CrudResult<()> {
        BooksModel::update(self, &patch).await
    }

    async fn delete(&self, id: &str) -> CrudResult<()> {
        BooksModel::delete(self, id).await
    }
}
