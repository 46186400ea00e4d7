use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::{
    projection::{specifier::is_wildcard, ColumnCatalog, PluckError, Specifier},
    query::SelectExpr,
};

/// The compiled projection: parallel, ordered lists of select expressions
/// and output field names. Wildcards are already expanded; names are not
/// deduplicated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProjection {
    pub selects: Vec<SelectExpr>,
    pub fields: Vec<String>,
}

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lowercase and collapse every run of non-alphanumerics into a single `_`:
/// `COUNT(comments.id)` becomes `count_comments_id`.
pub fn slugify(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    SLUG_RE.replace_all(&lowered, "_").trim_matches('_').to_string()
}

/// Compile a specifier list against the scope's primary table, in order.
/// Fails before any query execution: an invalid specifier abandons the rest
/// of the list, and a wildcard over an unregistered table is an error, not a
/// skip.
pub fn resolve<C>(
    catalog: &C,
    primary_table: &str,
    specifiers: &[Specifier],
) -> Result<ResolvedProjection, PluckError>
where
    C: ColumnCatalog + ?Sized,
{
    let mut projection = ResolvedProjection { selects: Vec::new(), fields: Vec::new() };
    for specifier in specifiers {
        resolve_one(catalog, primary_table, specifier, &mut projection)?;
    }
    debug!(table = %primary_table, fields = ?projection.fields, "resolved projection");
    Ok(projection)
}

fn resolve_one<C>(
    catalog: &C,
    primary_table: &str,
    specifier: &Specifier,
    out: &mut ResolvedProjection,
) -> Result<(), PluckError>
where
    C: ColumnCatalog + ?Sized,
{
    match specifier {
        Specifier::Column(name) if is_wildcard(name) => {
            for column in table_columns(catalog, primary_table)? {
                out.selects.push(SelectExpr::Column(column.clone()));
                out.fields.push(column);
            }
        }
        Specifier::Column(name) => {
            out.selects.push(SelectExpr::Column(name.clone()));
            out.fields.push(name.clone());
        }
        Specifier::Expr(expr) => match expr.split_once('.') {
            Some((table, "*")) => {
                for column in table_columns(catalog, table)? {
                    out.selects.push(SelectExpr::Column(column.clone()));
                    out.fields.push(slugify(&format!("{table}_{column}")));
                }
            }
            _ => {
                out.selects.push(SelectExpr::Raw(expr.clone()));
                out.fields.push(slugify(expr));
            }
        },
        Specifier::Named(entries) => {
            for (name, expr) in entries {
                out.selects.push(SelectExpr::Raw(expr.clone()));
                out.fields.push(name.clone());
            }
        }
        Specifier::Dynamic(value) => match value {
            Value::String(expr) => {
                resolve_one(catalog, primary_table, &Specifier::Expr(expr.clone()), out)?
            }
            Value::Object(entries) => {
                for (name, expr) in entries {
                    let expr = match expr {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    out.selects.push(SelectExpr::Raw(expr));
                    out.fields.push(name.clone());
                }
            }
            other => return Err(PluckError::InvalidSpecifier(other.to_string())),
        },
    }
    Ok(())
}

fn table_columns<C>(catalog: &C, table: &str) -> Result<Vec<String>, PluckError>
where
    C: ColumnCatalog + ?Sized,
{
    catalog
        .columns_of(table)
        .ok_or_else(|| PluckError::UnresolvedTable(table.to_string()))
}
