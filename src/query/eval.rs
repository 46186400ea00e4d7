use std::cmp::Ordering;
use std::fmt;

use serde_json::{Map, Value};

use crate::query::{aggregate::value_cmp, QueryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "<>",
            Comparator::Lt => "<",
            Comparator::LtEq => "<=",
            Comparator::Gt => ">",
            Comparator::GtEq => ">=",
        };
        write!(f, "{op}")
    }
}

pub(crate) struct Eval;

impl Eval {
    /// Resolve a column reference against a joined row whose keys are
    /// qualified `table.column` names. Bare names try each table in `tables`
    /// order, primary table first.
    pub fn lookup(
        row: &Map<String, Value>,
        tables: &[String],
        name: &str,
    ) -> Result<Value, QueryError> {
        if name.contains('.') {
            return row
                .get(name)
                .cloned()
                .ok_or_else(|| QueryError::UnknownColumn(name.to_string()));
        }
        for table in tables {
            if let Some(v) = row.get(&format!("{table}.{name}")) {
                return Ok(v.clone());
            }
        }
        Err(QueryError::UnknownColumn(name.to_string()))
    }

    /// Two-valued comparison; any null operand fails the predicate.
    pub fn compare(left: &Value, op: Comparator, right: &Value) -> bool {
        if left.is_null() || right.is_null() {
            return false;
        }
        match value_cmp(left, right) {
            Some(ord) => match op {
                Comparator::Eq => ord == Ordering::Equal,
                Comparator::NotEq => ord != Ordering::Equal,
                Comparator::Lt => ord == Ordering::Less,
                Comparator::LtEq => ord != Ordering::Greater,
                Comparator::Gt => ord == Ordering::Greater,
                Comparator::GtEq => ord != Ordering::Less,
            },
            None => op == Comparator::NotEq,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert((*k).to_string(), v.clone());
        }
        m
    }

    #[test]
    fn qualified_lookup_is_direct() {
        let r = row(&[("posts.id", json!(1)), ("comments.id", json!(9))]);
        let tables = vec!["posts".to_string(), "comments".to_string()];
        assert_eq!(Eval::lookup(&r, &tables, "comments.id").unwrap(), json!(9));
        assert!(matches!(
            Eval::lookup(&r, &tables, "comments.body"),
            Err(QueryError::UnknownColumn(_))
        ));
    }

    #[test]
    fn bare_lookup_prefers_primary_table() {
        let r = row(&[("posts.id", json!(1)), ("comments.id", json!(9)), ("comments.body", json!("hi"))]);
        let tables = vec!["posts".to_string(), "comments".to_string()];
        assert_eq!(Eval::lookup(&r, &tables, "id").unwrap(), json!(1));
        assert_eq!(Eval::lookup(&r, &tables, "body").unwrap(), json!("hi"));
        assert!(matches!(
            Eval::lookup(&r, &tables, "age"),
            Err(QueryError::UnknownColumn(_))
        ));
    }

    #[test]
    fn comparisons_over_numbers_and_strings() {
        assert!(Eval::compare(&json!(2), Comparator::Gt, &json!(1)));
        assert!(Eval::compare(&json!(2), Comparator::Eq, &json!(2.0)));
        assert!(Eval::compare(&json!("a"), Comparator::Lt, &json!("b")));
        assert!(!Eval::compare(&json!("a"), Comparator::Eq, &json!("b")));
    }

    #[test]
    fn null_operands_never_match() {
        assert!(!Eval::compare(&Value::Null, Comparator::Eq, &Value::Null));
        assert!(!Eval::compare(&json!(1), Comparator::Lt, &Value::Null));
    }

    #[test]
    fn mismatched_kinds_only_satisfy_not_eq() {
        assert!(Eval::compare(&json!(1), Comparator::NotEq, &json!("1")));
        assert!(!Eval::compare(&json!(1), Comparator::Eq, &json!("1")));
        assert!(!Eval::compare(&json!(1), Comparator::Lt, &json!("1")));
    }
}
