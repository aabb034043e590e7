//! Match-predicate compiler.
//!
//! Search requests describe each field predicate as a [`MatchOption`]: an integer
//! `match_type` code plus a [`MatchValue`]. Compiling an option validates both and
//! produces a backend-neutral [`Expr`] fragment.
//!
//! | code | kind | value | semantics |
//! |---|---|---|---|
//! | 0 | `Equal` | string | exact, case-sensitive |
//! | 1 | `Partial` | string | substring, case-insensitive |
//! | 2 | `StartsWith` | string | prefix, case-insensitive |
//! | 3 | `EndsWith` | string | suffix, case-insensitive |
//! | 4 | `ContainsIn` | list | array field intersects the list |
//!
//! ```ignore
//! let option = MatchOption::partial("dune");
//! let expr = option.compile("title")?;
//! ```

use std::fmt;

use bson::Bson;
use serde::{Deserialize, Serialize};

use crate::error::{CrudError, CrudResult};
use crate::query::{Expr, Filter};

/// The supported ways of matching a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Equal,
    Partial,
    StartsWith,
    EndsWith,
    ContainsIn,
}

impl MatchKind {
    /// Wire code of this kind.
    pub fn code(self) -> i64 {
        match self {
            MatchKind::Equal => 0,
            MatchKind::Partial => 1,
            MatchKind::StartsWith => 2,
            MatchKind::EndsWith => 3,
            MatchKind::ContainsIn => 4,
        }
    }

    /// Resolves a wire code, failing with `MatchTypeInvalid` for unknown codes.
    pub fn from_code(code: i64) -> CrudResult<Self> {
        match code {
            0 => Ok(MatchKind::Equal),
            1 => Ok(MatchKind::Partial),
            2 => Ok(MatchKind::StartsWith),
            3 => Ok(MatchKind::EndsWith),
            4 => Ok(MatchKind::ContainsIn),
            other => Err(CrudError::MatchTypeInvalid(other)),
        }
    }

    /// Compiles a predicate on `field` for `value`.
    pub fn compile(self, field: &str, value: &MatchValue) -> CrudResult<Expr> {
        match (self, value) {
            (MatchKind::Equal, MatchValue::Text(text)) => Ok(Filter::eq(field, text.as_str())),
            (MatchKind::Partial, MatchValue::Text(text)) => {
                Ok(Filter::contains(field, text.as_str()))
            }
            (MatchKind::StartsWith, MatchValue::Text(text)) => {
                Ok(Filter::starts_with(field, text.as_str()))
            }
            (MatchKind::EndsWith, MatchValue::Text(text)) => {
                Ok(Filter::ends_with(field, text.as_str()))
            }
            (MatchKind::ContainsIn, MatchValue::List(values)) => {
                let values: Vec<Bson> = values.iter().map(|v| Bson::String(v.clone())).collect();
                Ok(Filter::any_of(field, Bson::Array(values)))
            }
            (kind, value) => Err(CrudError::MatchValueInvalid {
                value_type: value.type_name(),
                kind,
            }),
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchKind::Equal => "Equal",
            MatchKind::Partial => "Partial",
            MatchKind::StartsWith => "StartsWith",
            MatchKind::EndsWith => "EndsWith",
            MatchKind::ContainsIn => "ContainsIn",
        };
        f.write_str(name)
    }
}

/// The operand of a match predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchValue {
    Text(String),
    List(Vec<String>),
}

impl MatchValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            MatchValue::Text(_) => "string",
            MatchValue::List(_) => "list",
        }
    }
}

impl From<&str> for MatchValue {
    fn from(value: &str) -> Self {
        MatchValue::Text(value.to_string())
    }
}

impl From<String> for MatchValue {
    fn from(value: String) -> Self {
        MatchValue::Text(value)
    }
}

impl From<Vec<String>> for MatchValue {
    fn from(values: Vec<String>) -> Self {
        MatchValue::List(values)
    }
}

/// A single field predicate as it arrives in a search request.
///
/// `match_type` stays a raw code so an unknown kind surfaces as `MatchTypeInvalid`
/// when the option is compiled rather than as a decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOption {
    pub match_type: i64,
    pub value: MatchValue,
}

impl MatchOption {
    pub fn new(kind: MatchKind, value: impl Into<MatchValue>) -> Self {
        MatchOption {
            match_type: kind.code(),
            value: value.into(),
        }
    }

    pub fn equal(value: impl Into<String>) -> Self {
        Self::new(MatchKind::Equal, value.into())
    }

    pub fn partial(value: impl Into<String>) -> Self {
        Self::new(MatchKind::Partial, value.into())
    }

    pub fn starts_with(value: impl Into<String>) -> Self {
        Self::new(MatchKind::StartsWith, value.into())
    }

    pub fn ends_with(value: impl Into<String>) -> Self {
        Self::new(MatchKind::EndsWith, value.into())
    }

    pub fn contains_in<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            MatchKind::ContainsIn,
            values.into_iter().map(Into::into).collect::<Vec<String>>(),
        )
    }

    pub fn kind(&self) -> CrudResult<MatchKind> {
        MatchKind::from_code(self.match_type)
    }

    pub fn compile(&self, field: &str) -> CrudResult<Expr> {
        self.kind()?.compile(field, &self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldOp;

    #[test]
    fn compiles_each_kind() {
        assert_eq!(
            MatchOption::equal("Dune").compile("title").unwrap(),
            Filter::eq("title", "Dune")
        );
        assert_eq!(
            MatchOption::partial("un").compile("title").unwrap(),
            Filter::contains("title", "un")
        );
        assert_eq!(
            MatchOption::starts_with("Du").compile("title").unwrap(),
            Filter::starts_with("title", "Du")
        );
        assert_eq!(
            MatchOption::ends_with("ne").compile("title").unwrap(),
            Filter::ends_with("title", "ne")
        );

        let expr = MatchOption::contains_in(["sci-fi", "classic"])
            .compile("categories")
            .unwrap();
        match expr {
            Expr::Field { field, op, value } => {
                assert_eq!(field, "categories");
                assert_eq!(op, FieldOp::AnyOf);
                assert_eq!(value, Bson::Array(vec!["sci-fi".into(), "classic".into()]));
            }
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        let option = MatchOption {
            match_type: 9,
            value: "x".into(),
        };

        assert!(matches!(
            option.compile("title"),
            Err(CrudError::MatchTypeInvalid(9))
        ));
        assert!(matches!(
            MatchKind::from_code(-1),
            Err(CrudError::MatchTypeInvalid(-1))
        ));
    }

    #[test]
    fn value_shape_must_fit_kind() {
        let list_for_partial = MatchOption::new(MatchKind::Partial, vec!["a".to_string()]);
        assert!(matches!(
            list_for_partial.compile("title"),
            Err(CrudError::MatchValueInvalid { value_type: "list", kind: MatchKind::Partial })
        ));

        let text_for_contains = MatchOption::new(MatchKind::ContainsIn, "a");
        assert!(matches!(
            text_for_contains.compile("categories"),
            Err(CrudError::MatchValueInvalid { value_type: "string", kind: MatchKind::ContainsIn })
        ));
    }

    #[test]
    fn decodes_wire_format() {
        let text: MatchOption =
            serde_json::from_str(r#"{"match_type": 1, "value": "dune"}"#).unwrap();
        assert_eq!(text, MatchOption::partial("dune"));

        let list: MatchOption =
            serde_json::from_str(r#"{"match_type": 4, "value": ["a", "b"]}"#).unwrap();
        assert_eq!(list, MatchOption::contains_in(["a", "b"]));
    }
}
