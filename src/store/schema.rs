use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Coarse classification of the JSON value shapes seen while inferring a
/// table schema: Null, Bool, Int, Float, String, Object or Array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Bool,
    Int,
    Float,
    String,
    Object,
    Array,
}

impl ValueType {
    pub fn of_value(v: &Value) -> ValueType {
        match v {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() {
                    ValueType::Int
                } else {
                    ValueType::Float
                }
            }
            Value::String(_) => ValueType::String,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Promote two types to a common representative for schema merging.
    /// `Int` + `Float` -> `Float`; `Null` yields the other side (nullability
    /// is tracked separately); otherwise the first-seen type wins.
    pub fn promote(a: ValueType, b: ValueType) -> ValueType {
        use ValueType::*;
        if a == b {
            return a;
        }
        match (a, b) {
            (Int, Float) | (Float, Int) => Float,
            (Null, y) => y,
            (x, _) => x,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub ty: ValueType,
    pub nullable: bool,
}

impl ColumnInfo {
    pub fn infer(value: &Value) -> ColumnInfo {
        let ty = ValueType::of_value(value);
        ColumnInfo { ty, nullable: ty == ValueType::Null }
    }

    pub fn merge(&self, new: &ColumnInfo) -> ColumnInfo {
        ColumnInfo {
            ty: ValueType::promote(self.ty, new.ty),
            nullable: self.nullable || new.nullable,
        }
    }
}

/// Ordered column metadata for a table. Column order is the order columns
/// were first seen, which doubles as the declared order for wildcard
/// projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub columns: IndexMap<String, ColumnInfo>,
}

impl TableSchema {
    pub fn get(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn infer_from_object(obj: &Map<String, Value>) -> TableSchema {
        let mut columns = IndexMap::new();
        for (k, v) in obj {
            columns.insert(k.clone(), ColumnInfo::infer(v));
        }
        TableSchema { columns }
    }

    /// Merge one more row into the schema: absent columns flip to nullable,
    /// present columns promote their type.
    pub fn merge_object(&mut self, obj: &Map<String, Value>) {
        for (name, info) in self.columns.iter_mut() {
            if !obj.contains_key(name) {
                info.nullable = true;
            }
        }
        for (name, value) in obj {
            let new = ColumnInfo::infer(value);
            match self.columns.get_mut(name) {
                Some(old) => *old = old.merge(&new),
                None => {
                    self.columns.insert(name.clone(), new);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn column_order_is_first_seen_order() {
        let mut s = TableSchema::infer_from_object(&obj(json!({
            "id": 1, "name": "Ana", "created_at": "2024-01-01"
        })));
        s.merge_object(&obj(json!({ "id": 2, "name": "Bob", "created_at": "2024-01-02", "email": "b@x.com" })));
        assert_eq!(s.column_names(), vec!["id", "name", "created_at", "email"]);
    }

    #[test]
    fn missing_and_null_values_mark_nullable() {
        let mut s = TableSchema::infer_from_object(&obj(json!({ "id": 1, "age": 30 })));
        assert!(!s.get("age").unwrap().nullable);

        s.merge_object(&obj(json!({ "id": 2 })));
        assert!(s.get("age").unwrap().nullable);
        assert!(!s.get("id").unwrap().nullable);

        s.merge_object(&obj(json!({ "id": 3, "age": null })));
        assert_eq!(s.get("age").unwrap().ty, ValueType::Int);
        assert!(s.get("age").unwrap().nullable);
    }

    #[test]
    fn numeric_promotion_int_to_float() {
        let mut s = TableSchema::infer_from_object(&obj(json!({ "price": 10 })));
        assert_eq!(s.get("price").unwrap().ty, ValueType::Int);
        s.merge_object(&obj(json!({ "price": 10.5 })));
        assert_eq!(s.get("price").unwrap().ty, ValueType::Float);
    }
}
