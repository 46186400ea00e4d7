use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::query::{aggregate, QueryError};

/// One selectable expression handed to the row fetch.
///
/// `Column` is an identifier the query layer resolves (bare or
/// table-qualified). `Raw` is forwarded verbatim, never escaped or quoted —
/// the raw-SQL marker. Callers must not build `Raw` values from untrusted
/// input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectExpr {
    Column(String),
    Raw(String),
}

impl fmt::Display for SelectExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectExpr::Column(name) => write!(f, "{name}"),
            SelectExpr::Raw(sql) => write!(f, "{sql}"),
        }
    }
}

/// What the in-memory query layer understood a select expression to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedSelect {
    Column(String),
    Aggregate { func: String, arg: AggregateArg },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AggregateArg {
    Star,
    Column(String),
}

static CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*(\*|[A-Za-z_][A-Za-z0-9_.]*)\s*\)$").unwrap()
});
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap());

impl SelectExpr {
    /// Parse just enough SQL for an in-memory host: a single aggregate call
    /// or a column reference. Anything richer is rejected rather than
    /// silently misread.
    pub(crate) fn parse(&self) -> Result<ParsedSelect, QueryError> {
        match self {
            SelectExpr::Column(name) => Ok(ParsedSelect::Column(name.clone())),
            SelectExpr::Raw(sql) => {
                let text = sql.trim();
                if let Some(caps) = CALL_RE.captures(text) {
                    let func = caps[1].to_ascii_lowercase();
                    if !aggregate::is_aggregate(&func) {
                        return Err(QueryError::UnsupportedExpression(sql.clone()));
                    }
                    let arg = match &caps[2] {
                        "*" => AggregateArg::Star,
                        column => AggregateArg::Column(column.to_string()),
                    };
                    return Ok(ParsedSelect::Aggregate { func, arg });
                }
                if IDENT_RE.is_match(text) {
                    return Ok(ParsedSelect::Column(text.to_string()));
                }
                Err(QueryError::UnsupportedExpression(sql.clone()))
            }
        }
    }
}
