//! Query translation from crudlayer filter expressions to MongoDB query syntax.
//!
//! String operators become case-insensitive `$regex` matches over the escaped literal
//! value, array membership becomes `$in`.

use bson::{Bson, Document, doc};

use crudlayer_core::{
    error::StoreError,
    query::{Expr, FieldOp, QueryVisitor},
};

/// Translates crudlayer filter expressions into MongoDB query documents.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Renders `expr` as a query document.
    pub fn translate(expr: &Expr) -> Result<Document, StoreError> {
        MongoQueryTranslator.visit_expr(expr)
    }
}

/// Case-insensitive `$regex` condition. Callers escape literal text with [`regex::escape`].
fn regex_condition(pattern: String) -> Document {
    doc! { "$regex": pattern, "$options": "i" }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = StoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! {});
        }

        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            // $or rejects an empty list; this matches nothing instead.
            return Ok(doc! { "$nor": [{}] });
        }

        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let requires_string = |name: &str| {
            StoreError::Backend(format!("{name} operator requires a string value"))
        };

        Ok(doc! {
            field: match op {
                FieldOp::Eq => doc! { "$eq": value },
                FieldOp::Contains => match value {
                    Bson::String(s) => regex_condition(regex::escape(s)),
                    _ => return Err(requires_string("Contains")),
                },
                FieldOp::StartsWith => match value {
                    Bson::String(s) => regex_condition(format!("^{}", regex::escape(s))),
                    _ => return Err(requires_string("StartsWith")),
                },
                FieldOp::EndsWith => match value {
                    Bson::String(s) => regex_condition(format!("{}$", regex::escape(s))),
                    _ => return Err(requires_string("EndsWith")),
                },
                FieldOp::AnyOf => match value {
                    Bson::Array(_) => doc! { "$in": value },
                    _ => return Err(StoreError::Backend(
                        "AnyOf operator requires an array value".to_string(),
                    )),
                },
            }
        })
    }
}
