use std::cmp::Ordering;

use serde_json::Value;

/// Per-group aggregate state. The scope evaluates the call's argument per
/// row, feeds it through `update`, and reads the result with `finalize`
/// after the last row of the group.
pub trait Accumulator: Send {
    fn update(&mut self, value: &Value);
    fn finalize(&self) -> Value;
}

pub fn is_aggregate(name: &str) -> bool {
    matches!(name, "count" | "sum" | "avg" | "min" | "max")
}

/// Case-insensitive lookup of a fresh accumulator.
pub fn accumulator_for(name: &str) -> Option<Box<dyn Accumulator>> {
    match name.to_ascii_lowercase().as_str() {
        "count" => Some(Box::new(CountAcc(0))),
        "sum" => Some(Box::new(SumAcc::Empty)),
        "avg" => Some(Box::new(AvgAcc { sum: 0.0, n: 0 })),
        "min" => Some(Box::new(MinMaxAcc { best: None, want: Ordering::Less })),
        "max" => Some(Box::new(MinMaxAcc { best: None, want: Ordering::Greater })),
        _ => None,
    }
}

/// COUNT(expr) counts non-null values; the scope feeds COUNT(*) a non-null
/// sentinel so every row counts.
struct CountAcc(i64);

impl Accumulator for CountAcc {
    fn update(&mut self, value: &Value) {
        if !value.is_null() {
            self.0 += 1;
        }
    }

    fn finalize(&self) -> Value {
        Value::Number(self.0.into())
    }
}

/// Tracks the numeric kind seen so far; promotes to float when mixed.
enum SumAcc {
    Empty,
    Int(i64),
    Float(f64),
}

impl Accumulator for SumAcc {
    fn update(&mut self, value: &Value) {
        let Value::Number(n) = value else { return };
        if let Some(i) = n.as_i64() {
            match self {
                SumAcc::Empty => *self = SumAcc::Int(i),
                SumAcc::Int(acc) => *acc += i,
                SumAcc::Float(acc) => *acc += i as f64,
            }
        } else if let Some(f) = n.as_f64() {
            match self {
                SumAcc::Empty => *self = SumAcc::Float(f),
                SumAcc::Int(acc) => *self = SumAcc::Float(*acc as f64 + f),
                SumAcc::Float(acc) => *acc += f,
            }
        }
    }

    fn finalize(&self) -> Value {
        match self {
            // SQL SUM over no non-null input is NULL
            SumAcc::Empty => Value::Null,
            SumAcc::Int(i) => Value::Number((*i).into()),
            SumAcc::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

struct AvgAcc {
    sum: f64,
    n: i64,
}

impl Accumulator for AvgAcc {
    fn update(&mut self, value: &Value) {
        if let Value::Number(n) = value {
            if let Some(f) = n.as_f64() {
                self.sum += f;
                self.n += 1;
            }
        }
    }

    fn finalize(&self) -> Value {
        if self.n == 0 {
            return Value::Null;
        }
        serde_json::Number::from_f64(self.sum / self.n as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

struct MinMaxAcc {
    best: Option<Value>,
    want: Ordering,
}

impl Accumulator for MinMaxAcc {
    fn update(&mut self, value: &Value) {
        if value.is_null() {
            return;
        }
        match &self.best {
            None => self.best = Some(value.clone()),
            Some(current) => {
                if let Some(ord) = value_cmp(value, current) {
                    if ord == self.want {
                        self.best = Some(value.clone());
                    }
                }
            }
        }
    }

    fn finalize(&self) -> Value {
        self.best.clone().unwrap_or(Value::Null)
    }
}

/// Partial order over scalar JSON values; incomparable kinds yield None and
/// are ignored by MIN/MAX.
pub(crate) fn value_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
