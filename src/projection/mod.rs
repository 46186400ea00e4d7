pub mod specifier;
pub use specifier::*;

pub mod resolve;
pub use resolve::*;

pub mod record;
pub use record::*;

pub mod pluck_error;
pub use pluck_error::*;

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::query::{QueryError, SelectExpr};

/// The query side of the seam: a scoped query that can name its primary
/// table and execute a list of select expressions into ordered scalar rows.
pub trait RowSource {
    fn table_name(&self) -> String;
    fn fetch_rows(&self, selects: &[SelectExpr]) -> Result<Vec<Vec<Value>>, QueryError>;
}

/// The metadata side of the seam: table name to ordered column names.
/// A registry lookup here stands in for whatever naming convention the host
/// uses to map tables to entity metadata.
pub trait ColumnCatalog {
    fn columns_of(&self, table: &str) -> Option<Vec<String>>;
}

/// Project a scoped query into records. One round trip per call; the record
/// shape is built fresh every time, never cached across calls.
pub trait Pluck {
    fn pluck(&self, specifiers: &[Specifier]) -> Result<Vec<Record>, PluckError>;

    /// Like `pluck`, with a hook to extend the record shape (typically to
    /// attach methods) before any record is built.
    fn pluck_with<F>(&self, specifiers: &[Specifier], behavior: F) -> Result<Vec<Record>, PluckError>
    where
        F: FnOnce(&mut RecordShape);
}

impl<S: RowSource + ColumnCatalog> Pluck for S {
    fn pluck(&self, specifiers: &[Specifier]) -> Result<Vec<Record>, PluckError> {
        self.pluck_with(specifiers, |_| {})
    }

    fn pluck_with<F>(&self, specifiers: &[Specifier], behavior: F) -> Result<Vec<Record>, PluckError>
    where
        F: FnOnce(&mut RecordShape),
    {
        let table = self.table_name();
        let resolved = resolve(self, &table, specifiers)?;

        let mut shape = RecordShape::new(resolved.fields)?;
        behavior(&mut shape);
        let shape = Arc::new(shape);

        debug!(table = %table, fields = shape.len(), "executing projection");
        let rows = self.fetch_rows(&resolved.selects)?;
        Ok(rows.into_iter().map(|values| shape.instantiate(values)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        projection::{all, col, named, sql},
        query::Comparator,
        store::{Db, DbCommon},
    };
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::cell::Cell;

    fn seed_db() -> Db {
        let mut db = Db::new_db();
        let authors = db.create("authors");
        authors.write().unwrap().add_batch(json!([
            { "id": 1, "name": "Henry" }
        ]));
        let posts = db.create("posts");
        posts.write().unwrap().add_batch(json!([
            { "id": 1, "title": "How to make pizza", "body": "Anim ullamco.", "author_id": 1 },
            { "id": 2, "title": "How to make pasta", "body": "Lorem ipsum.", "author_id": 1 }
        ]));
        let comments = db.create("comments");
        comments.write().unwrap().add_batch(json!([
            { "id": 10, "post_id": 1 },
            { "id": 11, "post_id": 1 },
            { "id": 12, "post_id": 2 },
            { "id": 13, "post_id": 2 },
            { "id": 14, "post_id": 2 }
        ]));
        db
    }

    #[test]
    fn pluck_single_column() {
        let db = seed_db();
        let authors = db.scope("authors").pluck(&[col("name")]).unwrap();

        assert_eq!(authors.len(), 1);
        let author = &authors[0];
        assert_eq!(author.get("name"), Some(&json!("Henry")));
        assert_eq!(author.get("id"), None);
        assert_eq!(author.values(), &[json!("Henry")]);
    }

    #[test]
    fn pluck_all_yields_every_column_in_declared_order() {
        let time = Utc.with_ymd_and_hms(2023, 11, 21, 0, 0, 0).unwrap().to_rfc3339();
        let mut db = Db::new_db();
        let authors = db.create("authors");
        authors.write().unwrap().add(json!({
            "id": 1, "name": "Henry", "created_at": time.clone(), "updated_at": time.clone()
        }));

        let records = db.scope("authors").pluck(&[all()]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].fields(),
            &["id", "name", "created_at", "updated_at"]
        );
        assert_eq!(
            records[0].values(),
            &[json!(1), json!("Henry"), json!(time.clone()), json!(time)]
        );
    }

    #[test]
    fn pluck_raw_strings_slug_their_field_names() {
        let db = seed_db();
        let posts = db
            .scope("posts")
            .filter("id", Comparator::Eq, json!(1))
            .pluck(&["title".into(), "posts.body".into()])
            .unwrap();

        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.get("title"), Some(&json!("How to make pizza")));
        assert_eq!(post.get("posts_body"), Some(&json!("Anim ullamco.")));
        assert_eq!(post.get("id"), None);
    }

    #[test]
    fn pluck_joined_wildcards() {
        let db = seed_db();
        let posts = db
            .scope("posts")
            .join("authors", "authors.id", "posts.author_id")
            .filter("posts.id", Comparator::Eq, json!(1))
            .pluck(&[all(), sql("authors.*")])
            .unwrap();

        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(
            post.fields(),
            &["id", "title", "body", "author_id", "authors_id", "authors_name"]
        );
        assert_eq!(post.get("title"), Some(&json!("How to make pizza")));
        assert_eq!(post.get("authors_name"), Some(&json!("Henry")));
        // bare column names resolve primary-table first, so `authors_id`
        // carries posts.id, as the host the original ran against did
        assert_eq!(post.get("authors_id"), post.get("id"));
    }

    #[test]
    fn pluck_named_expression_keeps_the_given_name() {
        let db = seed_db();
        let posts = db
            .scope("posts")
            .filter("id", Comparator::Eq, json!(1))
            .pluck(&[named("text", "body")])
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].get("text"), Some(&json!("Anim ullamco.")));
        assert_eq!(posts[0].get("body"), None);
    }

    #[test]
    fn pluck_grouped_join_with_aggregate() {
        let db = seed_db();
        let posts = db
            .scope("posts")
            .join("authors", "authors.id", "posts.author_id")
            .join("comments", "comments.post_id", "posts.id")
            .group("posts.id")
            .pluck(&[
                col("title"),
                sql("authors.name"),
                named("comments_count", "COUNT(comments.id)"),
            ])
            .unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].get("title"), Some(&json!("How to make pizza")));
        assert_eq!(posts[0].get("authors_name"), Some(&json!("Henry")));
        assert_eq!(posts[0].get("comments_count"), Some(&json!(2)));
        assert_eq!(posts[1].get("title"), Some(&json!("How to make pasta")));
        assert_eq!(posts[1].get("comments_count"), Some(&json!(3)));

        assert_eq!(
            serde_json::to_value(&posts).unwrap(),
            json!([
                { "title": "How to make pizza", "authors_name": "Henry", "comments_count": 2 },
                { "title": "How to make pasta", "authors_name": "Henry", "comments_count": 3 }
            ])
        );
    }

    #[test]
    fn attached_methods_exist_only_for_their_call() {
        let db = seed_db();
        let with_method = db
            .scope("authors")
            .pluck_with(&[col("name")], |shape| {
                shape.method("upcase_name", |r| {
                    json!(r.get("name").and_then(|v| v.as_str()).unwrap_or("").to_uppercase())
                });
            })
            .unwrap();
        let plain = db.scope("authors").pluck(&[col("name")]).unwrap();

        assert_eq!(with_method[0].call("upcase_name"), Some(json!("HENRY")));
        assert_eq!(plain[0].call("upcase_name"), None);
    }

    #[test]
    fn pluck_many_preserves_row_order() {
        let db = seed_db();
        let titles = db.scope("posts").pluck(&[col("title")]).unwrap();
        assert_eq!(
            titles.iter().map(Record::to_json).collect::<Vec<_>>(),
            vec![
                json!({ "title": "How to make pizza" }),
                json!({ "title": "How to make pasta" })
            ]
        );
    }

    #[test]
    fn empty_specifier_list_yields_zero_field_records() {
        let db = seed_db();
        let records = db.scope("authors").pluck(&[]).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].fields().is_empty());
    }

    #[test]
    fn unknown_column_is_a_query_passthrough() {
        let db = seed_db();
        let err = db.scope("authors").pluck(&[col("age")]).unwrap_err();
        assert_eq!(err, PluckError::Query(QueryError::UnknownColumn("age".into())));
        assert_eq!(err.to_string(), "query failed: no such column: age");
    }

    // fetch-counting source: proves pre-execution failures never reach the db
    struct CountingSource {
        fetches: Cell<usize>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self { fetches: Cell::new(0) }
        }
    }

    impl RowSource for CountingSource {
        fn table_name(&self) -> String {
            "posts".to_string()
        }
        fn fetch_rows(&self, selects: &[SelectExpr]) -> Result<Vec<Vec<Value>>, QueryError> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(vec![vec![Value::Null; selects.len()]])
        }
    }

    impl ColumnCatalog for CountingSource {
        fn columns_of(&self, table: &str) -> Option<Vec<String>> {
            (table == "posts").then(|| vec!["id".to_string(), "title".to_string()])
        }
    }

    #[test]
    fn invalid_specifier_fails_before_any_fetch() {
        let source = CountingSource::new();
        let err = source
            .pluck(&[col("title"), Specifier::Dynamic(json!(1))])
            .unwrap_err();
        assert_eq!(err, PluckError::InvalidSpecifier("1".into()));
        assert_eq!(source.fetches.get(), 0);
    }

    #[test]
    fn duplicate_fields_fail_before_any_fetch() {
        let source = CountingSource::new();
        let err = source.pluck(&[col("title"), col("title")]).unwrap_err();
        assert_eq!(err, PluckError::DuplicateField("title".into()));
        assert_eq!(source.fetches.get(), 0);
    }

    #[test]
    fn unresolved_wildcard_fails_before_any_fetch() {
        let source = CountingSource::new();
        let err = source.pluck(&[sql("readers.*")]).unwrap_err();
        assert_eq!(err, PluckError::UnresolvedTable("readers".into()));
        assert_eq!(source.fetches.get(), 0);
    }
}
