use serde_json::Value;
use tablegate_model::Record;

/// Restricts `record` to the columns in `projection`, keeping the record's
/// own key order. Requested columns the record lacks are simply absent.
pub fn project_record(record: Record, projection: &[String]) -> Record {
    record
        .into_iter()
        .filter(|(key, _)| projection.iter().any(|p| p == key))
        .collect()
}

/// Projects every row of a backend reply. Row order and count are unchanged.
///
/// Returns the index of the first row that is not an object.
pub fn project(rows: Vec<Value>, projection: &[String]) -> Result<Vec<Record>, usize> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(record) => Ok(project_record(record, projection)),
            _ => Err(i),
        })
        .collect()
}
