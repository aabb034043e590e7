//! Search pipeline construction.
//!
//! A [`SearchPipelineBuilder`] accumulates per-field match predicates, a sort order and
//! a skip/limit window, and builds a [`SearchPipeline`]. Backends run a pipeline in a
//! single round trip and answer with an [`AggregatedPage`]: the total number of matches
//! plus the requested window of rows.
//!
//! The builder is consuming and fallible so misuse surfaces where it happens:
//!
//! ```ignore
//! let pipeline = SearchPipelineBuilder::new()
//!     .sorted_by(vec![SortKey::asc("title"), SortKey::asc("author")])?
//!     .match_field("title", &MatchOption::partial("dune"))?
//!     .skip(10)
//!     .limit(10)
//!     .build();
//! ```

use std::collections::HashSet;

use bson::Document;

use crate::error::{CrudError, CrudResult};
use crate::matching::MatchOption;
use crate::query::Expr;

/// Sort direction for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9).
    Asc,
    /// Descending order (Z to A, 9 to 0).
    Desc,
}

impl SortDirection {
    /// The numeric form used in sort documents.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// One key of a sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        SortKey {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A fully assembled search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPipeline {
    /// Conjunction of all field predicates. Empty when nothing was matched.
    pub filter: Expr,
    /// Sort order applied before the window is taken.
    pub sort: Vec<SortKey>,
    /// Number of matching rows to skip.
    pub skip: u64,
    /// Maximum number of rows to return, `None` for all.
    pub limit: Option<u64>,
}

/// The result of running a [`SearchPipeline`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedPage {
    /// Number of rows in `data`.
    pub count: u64,
    /// Number of rows matching the filter, regardless of the window.
    pub total: u64,
    /// The requested window of rows.
    pub data: Vec<Document>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchPipelineBuilder {
    predicates: Vec<(String, Expr)>,
    sort: Vec<SortKey>,
    skip: u64,
    limit: Option<u64>,
}

impl SearchPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sort order.
    ///
    /// Fails with `SortListInvalid` when `keys` is empty or names a field twice.
    pub fn sorted_by(mut self, keys: Vec<SortKey>) -> CrudResult<Self> {
        if keys.is_empty() {
            return Err(CrudError::SortListInvalid("sort list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for key in &keys {
            if !seen.insert(key.field.as_str()) {
                return Err(CrudError::SortListInvalid(format!(
                    "key {} is duplicated",
                    key.field
                )));
            }
        }

        self.sort = keys;
        Ok(self)
    }

    /// Adds a compiled match predicate on `field`.
    pub fn match_field(self, field: &str, option: &MatchOption) -> CrudResult<Self> {
        let expr = option.compile(field)?;
        self.match_expr(field, expr)
    }

    /// Adds an already built predicate for `field`.
    ///
    /// Each field may carry one predicate; a second one fails with `MatchKeyDuplicated`.
    pub fn match_expr(mut self, field: &str, expr: Expr) -> CrudResult<Self> {
        if self.has_match(field) {
            return Err(CrudError::MatchKeyDuplicated(field.to_string()));
        }

        self.predicates.push((field.to_string(), expr));
        Ok(self)
    }

    pub fn has_match(&self, field: &str) -> bool {
        self.predicates.iter().any(|(name, _)| name == field)
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> SearchPipeline {
        SearchPipeline {
            filter: Expr::And(self.predicates.into_iter().map(|(_, expr)| expr).collect()),
            sort: self.sort,
            skip: self.skip,
            limit: self.limit,
        }
    }
}
