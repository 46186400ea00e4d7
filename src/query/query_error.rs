use std::fmt::Display;

/// Errors reported by the query layer while fetching rows. Projection treats
/// these as an opaque passthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    UnknownTable(String),
    UnknownColumn(String),
    UnsupportedExpression(String),
}

impl Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::UnknownTable(name) => write!(f, "no such table: {name}"),
            QueryError::UnknownColumn(name) => write!(f, "no such column: {name}"),
            QueryError::UnsupportedExpression(expr) => {
                write!(f, "unsupported expression: {expr}")
            }
        }
    }
}

impl std::error::Error for QueryError {}
