//! Collection schemas: required fields and indexes.
//!
//! A [`CollectionSchema`] describes what a valid document of a collection looks like and
//! which indexes it carries. Backends apply it when a collection is ensured: MongoDB
//! renders it as a strict `$jsonSchema` validator plus indexes, the in-memory backend
//! checks it on every write.
//!
//! ```ignore
//! let schema = CollectionSchema::builder("books_info")
//!     .field(FieldRule::string("book_id").non_empty())
//!     .field(FieldRule::string_array("categories").unique_items())
//!     .index(IndexSpec::new("book_id_1", ["book_id"]).unique())
//!     .build();
//! ```

use std::collections::HashSet;

use bson::{Bson, Document};

/// The type a field value must have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    StringArray {
        /// Whether the array may not repeat an element.
        unique_items: bool,
    },
}

/// A required field of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub name: String,
    pub field_type: FieldType,
    /// Rejects empty strings.
    pub non_empty: bool,
    pub description: Option<String>,
}

impl FieldRule {
    pub fn string(name: impl Into<String>) -> Self {
        FieldRule {
            name: name.into(),
            field_type: FieldType::String,
            non_empty: false,
            description: None,
        }
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        FieldRule {
            name: name.into(),
            field_type: FieldType::StringArray { unique_items: false },
            non_empty: false,
            description: None,
        }
    }

    pub fn non_empty(mut self) -> Self {
        self.non_empty = true;
        self
    }

    pub fn unique_items(mut self) -> Self {
        if let FieldType::StringArray { unique_items } = &mut self.field_type {
            *unique_items = true;
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks `value` against this rule, returning the reason it fails.
    fn check(&self, value: Option<&Bson>) -> Result<(), String> {
        let Some(value) = value else {
            return Err(format!("field {} is required", self.name));
        };

        match (&self.field_type, value) {
            (FieldType::String, Bson::String(text)) => {
                if self.non_empty && text.is_empty() {
                    return Err(format!("field {} must not be empty", self.name));
                }
                Ok(())
            }
            (FieldType::StringArray { unique_items }, Bson::Array(items)) => {
                let mut seen = HashSet::new();
                for item in items {
                    let Bson::String(text) = item else {
                        return Err(format!("field {} must only contain strings", self.name));
                    };
                    if *unique_items && !seen.insert(text.as_str()) {
                        return Err(format!("field {} contains duplicated item {}", self.name, text));
                    }
                }
                Ok(())
            }
            (FieldType::String, _) => Err(format!("field {} must be a string", self.name)),
            (FieldType::StringArray { .. }, _) => {
                Err(format!("field {} must be an array", self.name))
            }
        }
    }
}

/// An index over one or more ascending keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn new<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexSpec {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub name: String,
    pub fields: Vec<FieldRule>,
    pub indexes: Vec<IndexSpec>,
}

impl CollectionSchema {
    pub fn builder(name: impl Into<String>) -> CollectionSchemaBuilder {
        CollectionSchemaBuilder {
            schema: CollectionSchema {
                name: name.into(),
                fields: Vec::new(),
                indexes: Vec::new(),
            },
        }
    }

    /// Checks that `document` satisfies every field rule.
    ///
    /// Fields not named by a rule are allowed.
    pub fn validate(&self, document: &Document) -> Result<(), String> {
        self.fields
            .iter()
            .try_for_each(|rule| rule.check(document.get(&rule.name)))
    }

    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexSpec> {
        self.indexes.iter().filter(|index| index.unique)
    }
}

pub struct CollectionSchemaBuilder {
    schema: CollectionSchema,
}

impl CollectionSchemaBuilder {
    pub fn field(mut self, rule: FieldRule) -> Self {
        self.schema.fields.push(rule);
        self
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.schema.indexes.push(index);
        self
    }

    pub fn build(self) -> CollectionSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn schema() -> CollectionSchema {
        CollectionSchema::builder("books_info")
            .field(FieldRule::string("book_id").non_empty())
            .field(FieldRule::string("description"))
            .field(FieldRule::string_array("categories").unique_items())
            .index(IndexSpec::new("book_id_1", ["book_id"]).unique())
            .index(IndexSpec::new("title_1_author_1", ["title", "author"]))
            .build()
    }

    #[test]
    fn accepts_valid_document() {
        let document = doc! {
            "book_id": "book_1",
            "description": "",
            "categories": ["a", "b"],
            "extra": 1,
        };

        assert_eq!(schema().validate(&document), Ok(()));
    }

    #[test]
    fn rejects_missing_and_empty_fields() {
        let missing = doc! { "description": "", "categories": [] };
        assert!(schema().validate(&missing).unwrap_err().contains("book_id"));

        let empty = doc! { "book_id": "", "description": "", "categories": [] };
        assert!(schema().validate(&empty).unwrap_err().contains("must not be empty"));
    }

    #[test]
    fn rejects_wrong_types_and_duplicated_items() {
        let wrong_type = doc! { "book_id": 1, "description": "", "categories": [] };
        assert!(schema().validate(&wrong_type).is_err());

        let duplicated = doc! { "book_id": "b", "description": "", "categories": ["a", "a"] };
        assert!(schema().validate(&duplicated).unwrap_err().contains("duplicated"));
    }

    #[test]
    fn lists_only_unique_indexes() {
        let schema = schema();
        let names: Vec<&str> = schema.unique_indexes().map(|i| i.name.as_str()).collect();

        assert_eq!(names, vec!["book_id_1"]);
    }
}
