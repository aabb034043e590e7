//! Filter evaluation and ordering for in-memory documents.
//!
//! [`DocumentEvaluator`] walks an [`Expr`] against one document with the same semantics
//! the MongoDB backend renders: string operators ignore case, equality against an array
//! field matches any element, and a missing field never matches.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime};

use crudlayer_core::{
    error::StoreError,
    pipeline::{SortDirection, SortKey},
    query::{Expr, FieldOp, QueryVisitor},
};

/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl<'a> Comparable<'a> {
    /// Position of this value's type in the cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Bool(_) => 5,
            Comparable::DateTime(_) => 6,
        }
    }

    /// Total order used for sorting: nulls and missing fields first, then by type rank,
    /// then by value.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.partial_cmp(other).unwrap_or(Ordering::Equal))
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares two documents by a list of sort keys.
pub(crate) fn compare_documents(left: &Document, right: &Document, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let a = left.get(&key.field).map(Comparable::from).unwrap_or(Comparable::Null);
        let b = right.get(&key.field).map(Comparable::from).unwrap_or(Comparable::Null);

        let ordering = match key.direction {
            SortDirection::Asc => a.sort_cmp(&b),
            SortDirection::Desc => b.sort_cmp(&a),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<bool, StoreError> {
        self.visit_expr(expr)
    }

    /// Whether `document` matches `expr`.
    pub fn matches(document: &Document, expr: &Expr) -> Result<bool, StoreError> {
        DocumentEvaluator::new(document).evaluate(expr)
    }
}

fn lowercase_pair(left: &Comparable<'_>, right: &Comparable<'_>) -> Option<(String, String)> {
    match (left, right) {
        (Comparable::String(left), Comparable::String(right)) => {
            Some((left.to_lowercase(), right.to_lowercase()))
        }
        _ => None,
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            return Ok(false);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        match op {
            FieldOp::Eq => match &left {
                Comparable::Array(items) if !matches!(right, Comparable::Array(_)) => {
                    Ok(items.iter().any(|item| item == &right))
                }
                _ => Ok(left == right),
            },
            FieldOp::Contains => Ok(lowercase_pair(&left, &right)
                .is_some_and(|(left, right)| left.contains(&right))),
            FieldOp::StartsWith => Ok(lowercase_pair(&left, &right)
                .is_some_and(|(left, right)| left.starts_with(&right))),
            FieldOp::EndsWith => Ok(lowercase_pair(&left, &right)
                .is_some_and(|(left, right)| left.ends_with(&right))),
            FieldOp::AnyOf => {
                let Comparable::Array(candidates) = right else {
                    return Err(StoreError::InvalidDocument(format!(
                        "any_of on field {field} requires an array of candidates"
                    )));
                };

                Ok(match left {
                    Comparable::Array(items) => items
                        .iter()
                        .any(|item| candidates.iter().any(|candidate| candidate == item)),
                    single => candidates.iter().any(|candidate| candidate == &single),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use crudlayer_core::query::Filter;

    fn book() -> Document {
        doc! {
            "book_id": "book_1",
            "title": "Programming Rust",
            "author": "Jim Blandy",
            "categories": ["programming", "systems"],
        }
    }

    #[test]
    fn string_operators_ignore_case() {
        let book = book();

        assert!(DocumentEvaluator::matches(&book, &Filter::contains("title", "RUST")).unwrap());
        assert!(DocumentEvaluator::matches(&book, &Filter::starts_with("title", "program")).unwrap());
        assert!(DocumentEvaluator::matches(&book, &Filter::ends_with("author", "BLANDY")).unwrap());
        assert!(!DocumentEvaluator::matches(&book, &Filter::starts_with("title", "rust")).unwrap());
    }

    #[test]
    fn equality_is_case_sensitive() {
        let book = book();

        assert!(DocumentEvaluator::matches(&book, &Filter::eq("book_id", "book_1")).unwrap());
        assert!(!DocumentEvaluator::matches(&book, &Filter::eq("book_id", "BOOK_1")).unwrap());
    }

    #[test]
    fn equality_on_array_matches_element() {
        let book = book();

        assert!(DocumentEvaluator::matches(&book, &Filter::eq("categories", "systems")).unwrap());
    }

    #[test]
    fn any_of_intersects_arrays() {
        let book = book();

        let hit = Filter::any_of("categories", vec!["cooking", "systems"]);
        let miss = Filter::any_of("categories", vec!["cooking"]);

        assert!(DocumentEvaluator::matches(&book, &hit).unwrap());
        assert!(!DocumentEvaluator::matches(&book, &miss).unwrap());
    }

    #[test]
    fn empty_conjunction_matches_everything() {
        assert!(DocumentEvaluator::matches(&book(), &Expr::all()).unwrap());
        assert!(!DocumentEvaluator::matches(&book(), &Filter::or([])).unwrap());
    }

    #[test]
    fn missing_field_never_matches() {
        assert!(!DocumentEvaluator::matches(&book(), &Filter::contains("summary", "")).unwrap());
    }

    #[test]
    fn sorts_by_multiple_keys_with_missing_first() {
        let mut documents = vec![
            doc! { "title": "B", "author": "Y" },
            doc! { "title": "A", "author": "Z" },
            doc! { "title": "B", "author": "X" },
            doc! { "author": "W" },
        ];
        let sort = vec![SortKey::asc("title"), SortKey::desc("author")];

        documents.sort_by(|a, b| compare_documents(a, b, &sort));

        let order: Vec<&str> = documents
            .iter()
            .map(|d| d.get_str("author").unwrap())
            .collect();
        assert_eq!(order, vec!["W", "Z", "Y", "X"]);
    }
}
