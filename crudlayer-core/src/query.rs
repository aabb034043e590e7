//! Backend-neutral filter expressions.
//!
//! Filters are small trees of [`Expr`] values. Models and the match compiler build them,
//! and each backend renders them natively through a [`QueryVisitor`]: the MongoDB
//! backend turns them into query documents, the in-memory backend evaluates them
//! directly against stored documents.
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static constructors:
//!
//! - Equality: `eq`
//! - String: `contains`, `starts_with`, `ends_with` (all case-insensitive)
//! - Array: `any_of`
//! - Logical: `and`, `or`
//!
//! ```ignore
//! use crudlayer::query::Filter;
//!
//! let expr = Filter::or([
//!     Filter::eq("book_id", "book_1"),
//!     Filter::and([Filter::eq("title", "Dune"), Filter::eq("author", "Frank Herbert")]),
//! ]);
//! ```

use bson::Bson;

use crate::error::StoreError;

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact, case-sensitive). On an array field, matches when any element is equal.
    Eq,
    /// String contains the value, ignoring case.
    Contains,
    /// String starts with the value, ignoring case.
    StartsWith,
    /// String ends with the value, ignoring case.
    EndsWith,
    /// Field (or any element of an array field) equals one of the listed values.
    AnyOf,
}

/// A filter expression for querying documents.
///
/// An empty `And` matches every document, an empty `Or` matches none.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// An expression matching every document.
    pub fn all() -> Self {
        Expr::And(Vec::new())
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }
}

/// Helper struct for constructing filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the specified value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the string field contains the value, ignoring case.
    pub fn contains(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Contains, value.into())
    }

    /// Matches documents where the string field starts with the value, ignoring case.
    pub fn starts_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::StartsWith, value.into())
    }

    /// Matches documents where the string field ends with the value, ignoring case.
    pub fn ends_with(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::EndsWith, value.into())
    }

    /// Matches documents where the field intersects the given list.
    pub fn any_of(field: impl Into<String>, values: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::AnyOf, values.into())
    }

    /// Combines expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<StoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Field { field, op, value } => self.visit_field(field, op, value),
        }
    }
}
