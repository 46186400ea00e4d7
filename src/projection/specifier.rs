use indexmap::IndexMap;
use serde_json::Value;

/// One element of a projection argument list: what to select, and what to
/// call it on the resulting record.
#[derive(Debug, Clone, PartialEq)]
pub enum Specifier {
    /// A bare column of the scope's primary table; the field keeps the
    /// column's name. The reserved values `all` and `*` select every column
    /// of the primary table.
    Column(String),
    /// A `table.column` reference, `table.*` wildcard, or any SQL expression
    /// used verbatim. The field name is the slugified expression text.
    Expr(String),
    /// Output field name -> SQL expression, in insertion order. Names are
    /// kept exactly as given.
    Named(IndexMap<String, String>),
    /// Untyped input (e.g. read from configuration). Strings resolve like
    /// `Expr`, objects like `Named`; any other shape is an invalid
    /// specifier.
    Dynamic(Value),
}

pub fn col(name: impl Into<String>) -> Specifier {
    Specifier::Column(name.into())
}

/// Every column of the primary table.
pub fn all() -> Specifier {
    Specifier::Column("*".into())
}

/// A raw SQL expression, forwarded unescaped. Never build this from
/// untrusted input.
pub fn sql(expr: impl Into<String>) -> Specifier {
    Specifier::Expr(expr.into())
}

pub fn named(name: impl Into<String>, expr: impl Into<String>) -> Specifier {
    let mut map = IndexMap::new();
    map.insert(name.into(), expr.into());
    Specifier::Named(map)
}

impl From<&str> for Specifier {
    fn from(expr: &str) -> Self {
        Specifier::Expr(expr.to_string())
    }
}

impl From<String> for Specifier {
    fn from(expr: String) -> Self {
        Specifier::Expr(expr)
    }
}

impl From<Value> for Specifier {
    fn from(value: Value) -> Self {
        Specifier::Dynamic(value)
    }
}

pub(crate) fn is_wildcard(name: &str) -> bool {
    matches!(name, "all" | "*")
}
