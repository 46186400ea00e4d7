use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use crate::store::TableSchema;

/// Thread-safe handle to an in-memory table.
pub type Table = Arc<RwLock<InternalTable>>;

/// Rows are kept in insertion order so projections see them in the order the
/// store "returned" them, and the inferred schema keeps declared column
/// order for wildcard expansion.
pub struct InternalTable {
    pub name: String,
    rows: Vec<Map<String, Value>>,
    schema: Option<TableSchema>,
}

impl InternalTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            rows: Vec::new(),
            schema: None,
        }
    }

    pub fn into_protected(self) -> Table {
        Arc::new(RwLock::new(self))
    }

    /// Insert one row. Non-object values are rejected.
    pub fn add(&mut self, item: Value) -> bool {
        match item {
            Value::Object(map) => {
                match &mut self.schema {
                    None => self.schema = Some(TableSchema::infer_from_object(&map)),
                    Some(schema) => schema.merge_object(&map),
                }
                self.rows.push(map);
                true
            }
            _ => false,
        }
    }

    /// Insert every element of a JSON array, in order.
    pub fn add_batch(&mut self, items: Value) -> usize {
        let mut inserted = 0;
        if let Value::Array(list) = items {
            for item in list {
                if self.add(item) {
                    inserted += 1;
                }
            }
        }
        inserted
    }

    pub fn rows(&self) -> &[Map<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema(&self) -> Option<TableSchema> {
        self.schema.clone()
    }

    pub fn column_names(&self) -> Option<Vec<String>> {
        self.schema.as_ref().map(TableSchema::column_names)
    }
}
