use std::{collections::HashMap, fmt, sync::Arc};

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::projection::PluckError;

pub type RecordMethod = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// The shape of one projection call's records: ordered field names plus any
/// caller-attached methods. Built fresh per call and shared by that call's
/// records only.
pub struct RecordShape {
    fields: Vec<String>,
    index: HashMap<String, usize>,
    methods: HashMap<String, RecordMethod>,
}

impl RecordShape {
    /// Duplicate field names are rejected outright; the projection never
    /// picks a winner between colliding fields.
    pub(crate) fn new(fields: Vec<String>) -> Result<Self, PluckError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, name) in fields.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(PluckError::DuplicateField(name.clone()));
            }
        }
        Ok(Self { fields, index, methods: HashMap::new() })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Attach a method callable on every record of this shape.
    pub fn method<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.to_string(), Arc::new(f));
    }

    pub(crate) fn instantiate(self: &Arc<Self>, values: Vec<Value>) -> Record {
        Record { shape: Arc::clone(self), values }
    }
}

impl fmt::Debug for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordShape")
            .field("fields", &self.fields)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One projected row: positional values behind the shape's field names.
#[derive(Clone)]
pub struct Record {
    shape: Arc<RecordShape>,
    values: Vec<Value>,
}

impl Record {
    /// Value of a field, or None when the projection did not select it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.shape.index.get(field).map(|i| &self.values[*i])
    }

    pub fn fields(&self) -> &[String] {
        self.shape.fields()
    }

    /// Positional values, in field order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Invoke a method attached at projection time, if one exists under
    /// this name.
    pub fn call(&self, method: &str) -> Option<Value> {
        self.shape.methods.get(method).map(|f| f(self))
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.shape.methods.contains_key(method)
    }

    /// JSON object with the record's fields in order.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in self.shape.fields.iter().zip(&self.values) {
            map.insert(name.clone(), value.clone());
        }
        Value::Object(map)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.shape.fields == other.shape.fields && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("Record");
        for (name, value) in self.shape.fields.iter().zip(&self.values) {
            dbg.field(name, value);
        }
        dbg.finish()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.shape.fields.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
