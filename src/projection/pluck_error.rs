use std::fmt::Display;

use crate::query::QueryError;

/// Projection failures. All variants propagate to the caller as-is: no
/// retries, no partial results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluckError {
    /// A specifier whose shape is none of column / expression / named map.
    /// Carries the offending value's textual form. Raised before any query
    /// execution.
    InvalidSpecifier(String),
    /// Wildcard expansion hit a table with no column metadata. Raised before
    /// any query execution.
    UnresolvedTable(String),
    /// Two resolved fields share a name. The record shape rejects this
    /// outright rather than picking a winner.
    DuplicateField(String),
    /// Passthrough of whatever the query layer reported.
    Query(QueryError),
}

impl Display for PluckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluckError::InvalidSpecifier(value) => {
                write!(f, "invalid pluck argument: '{value}'")
            }
            PluckError::UnresolvedTable(table) => {
                write!(f, "cannot expand wildcard: unknown table '{table}'")
            }
            PluckError::DuplicateField(name) => {
                write!(f, "duplicate field name '{name}' in projection")
            }
            PluckError::Query(e) => write!(f, "query failed: {e}"),
        }
    }
}

impl std::error::Error for PluckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PluckError::Query(e) => Some(e),
            _ => None,
        }
    }
}

impl From<QueryError> for PluckError {
    fn from(e: QueryError) -> Self {
        PluckError::Query(e)
    }
}
