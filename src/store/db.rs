use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    projection::ColumnCatalog,
    query::Scope,
    store::{InternalTable, Table},
};

/// Thread-safe handle to the in-memory store.
pub type Db = Arc<RwLock<InternalDb>>;

#[derive(Default)]
pub struct InternalDb {
    tables: HashMap<String, Table>,
}

impl InternalDb {
    pub fn into_protected(self) -> Db {
        Arc::new(RwLock::new(self))
    }

    pub fn create(&mut self, table_name: &str) -> Table {
        let table = InternalTable::new(table_name).into_protected();
        self.tables
            .insert(table_name.to_ascii_lowercase(), Arc::clone(&table));
        table
    }

    pub fn get(&self, table_name: &str) -> Option<Table> {
        self.tables.get(&table_name.to_ascii_lowercase()).map(Arc::clone)
    }

    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

pub trait DbCommon {
    fn new_db() -> Self;
    fn create(&mut self, table_name: &str) -> Table;
    fn get(&self, table_name: &str) -> Option<Table>;
    fn list_tables(&self) -> Vec<String>;
    /// Start a scoped query over one table.
    fn scope(&self, table_name: &str) -> Scope;
}

impl DbCommon for Db {
    fn new_db() -> Self {
        InternalDb::default().into_protected()
    }

    fn create(&mut self, table_name: &str) -> Table {
        self.write().unwrap().create(table_name)
    }

    fn get(&self, table_name: &str) -> Option<Table> {
        self.read().unwrap().get(table_name)
    }

    fn list_tables(&self) -> Vec<String> {
        self.read().unwrap().list_tables()
    }

    fn scope(&self, table_name: &str) -> Scope {
        Scope::new(self, table_name)
    }
}

/// The store resolves table names by plain registry lookup; hosts with other
/// naming conventions supply their own `ColumnCatalog`.
impl ColumnCatalog for Db {
    fn columns_of(&self, table: &str) -> Option<Vec<String>> {
        let table = self.get(table)?;
        let names = table.read().unwrap().column_names();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_get_and_list() {
        let mut db = Db::new_db();
        db.create("posts");
        db.create("Comments");

        assert!(db.get("posts").is_some());
        assert!(db.get("comments").is_some());
        assert!(db.get("authors").is_none());

        let mut tables = db.list_tables();
        tables.sort();
        assert_eq!(tables, vec!["comments", "posts"]);
    }

    #[test]
    fn columns_of_reads_declared_order() {
        let mut db = Db::new_db();
        let t = db.create("authors");
        t.write().unwrap().add_batch(json!([
            { "id": 1, "name": "Henry", "created_at": "2023-11-21T00:00:00Z" }
        ]));

        assert_eq!(
            db.columns_of("authors").unwrap(),
            vec!["id", "name", "created_at"]
        );
        assert!(db.columns_of("people").is_none());
    }

    #[test]
    fn columns_of_empty_table_is_none() {
        let mut db = Db::new_db();
        db.create("posts");
        assert!(db.columns_of("posts").is_none());
    }
}
