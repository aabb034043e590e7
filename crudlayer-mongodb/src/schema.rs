//! Renders a [`CollectionSchema`] as a `$jsonSchema` validator and index models.

use bson::{Bson, Document, doc};
use mongodb::{IndexModel, options::IndexOptions};

use crudlayer_core::schema::{CollectionSchema, FieldRule, FieldType};

pub(crate) fn render_validator(schema: &CollectionSchema) -> Document {
    let mut properties = Document::new();
    for rule in &schema.fields {
        properties.insert(rule.name.clone(), render_field(rule));
    }

    let required: Vec<Bson> = schema
        .fields
        .iter()
        .map(|rule| Bson::String(rule.name.clone()))
        .collect();

    doc! {
        "$jsonSchema": {
            "bsonType": "object",
            "required": required,
            "properties": properties,
        }
    }
}

fn render_field(rule: &FieldRule) -> Document {
    let mut property = match &rule.field_type {
        FieldType::String => {
            let mut property = doc! { "bsonType": "string" };
            if rule.non_empty {
                property.insert("minLength", 1);
            }
            property
        }
        FieldType::StringArray { unique_items } => doc! {
            "bsonType": "array",
            "uniqueItems": *unique_items,
            "items": { "bsonType": "string" },
        },
    };

    if let Some(description) = &rule.description {
        property.insert("description", description.clone());
    }

    property
}

pub(crate) fn render_indexes(schema: &CollectionSchema) -> Vec<IndexModel> {
    schema
        .indexes
        .iter()
        .map(|index| {
            let mut keys = Document::new();
            for key in &index.keys {
                keys.insert(key.clone(), 1);
            }

            IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(index.name.clone())
                        .unique(index.unique)
                        .build(),
                )
                .build()
        })
        .collect()
}
