use geojson::JsonObject;
use serde_json::Value;

use crate::tabular::record::{FieldValue, FlatRecord, PROPERTIES_PREFIX};

/// Flatten the properties of a feature into a record with `Properties.<key>` keys.
///
/// Only one level is flattened. Nested objects and arrays are kept as their compact
/// JSON text in a single cell.
pub fn flatten_properties(properties: Option<&JsonObject>) -> FlatRecord {
    match properties {
        Some(properties) => properties
            .iter()
            .map(|(key, value)| (format!("{}{}", PROPERTIES_PREFIX, key), field_value(value)))
            .collect(),
        None => FlatRecord::new(),
    }
}

fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::String(text) => FieldValue::Text(text.clone()),
        Value::Number(number) => FieldValue::from(number),
        Value::Bool(value) => FieldValue::Bool(*value),
        Value::Null => FieldValue::Null,
        Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}
