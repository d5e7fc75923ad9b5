//! Flat record types and column alignment.

use serde_json::{Map, Value};

/// One normalized row: field name to JSON value, in upstream field order.
pub type Record = Map<String, Value>;

/// An ordered sequence of records from a single upstream response.
pub type ResultSet = Vec<Record>;

/// Align every record to the same field set.
///
/// Columns are the union of all field names in order of first appearance;
/// a record missing a column gets `null` for it. Row order is untouched.
pub fn align_columns(records: Vec<Record>) -> ResultSet {
    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    records
        .into_iter()
        .map(|mut record| {
            let mut aligned = Record::with_capacity(columns.len());
            for column in &columns {
                let value = record.remove(column).unwrap_or(Value::Null);
                aligned.insert(column.clone(), value);
            }
            aligned
        })
        .collect()
}
