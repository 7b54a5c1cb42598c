use serde_json::{Map, Value};

/// A row as exchanged with the backend. Key order is the backend's column order.
pub type Record = Map<String, Value>;

/// Typed accessors over a [`Record`].
pub trait RecordExt {
    /// A string column.
    fn get_str(&self, field: &str) -> Option<&str>;

    /// An integer column.
    fn get_i64(&self, field: &str) -> Option<i64>;

    /// A numeric column, widened to `f64`.
    fn get_f64(&self, field: &str) -> Option<f64>;

    /// A boolean column.
    fn get_bool(&self, field: &str) -> Option<bool>;

    /// True when the column is absent or `null`.
    fn is_null(&self, field: &str) -> bool;
}

impl RecordExt for Record {
    fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    fn is_null(&self, field: &str) -> bool {
        self.get(field).is_none_or(Value::is_null)
    }
}
