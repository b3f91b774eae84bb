use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

/// Placeholder for a value that could not be computed.
pub const NO_DATA: &str = "No Data";

pub const PROPERTIES_PREFIX: &str = "Properties.";

pub const START_LATITUDE: &str = "Geometry.Start.Latitude";
pub const START_LONGITUDE: &str = "Geometry.Start.Longitude";
pub const END_LATITUDE: &str = "Geometry.End.Latitude";
pub const END_LONGITUDE: &str = "Geometry.End.Longitude";

pub const DISTANCE_KM: &str = "Distance in Kilo Meters";
pub const CUMULATIVE_DISTANCE_KM: &str = "Cumulative Distance in Kilo Meters";
pub const DISTANCE_MILES: &str = "Distance in Miles";
pub const CUMULATIVE_DISTANCE_MILES: &str = "Cumulative Distance in Miles";

pub const GEOMETRY_KEYS: [&str; 4] = [START_LATITUDE, START_LONGITUDE, END_LATITUDE, END_LONGITUDE];
pub const DISTANCE_KEYS: [&str; 4] = [
    DISTANCE_KM,
    CUMULATIVE_DISTANCE_KM,
    DISTANCE_MILES,
    CUMULATIVE_DISTANCE_MILES,
];

/// Largest integer magnitude an f64 holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
/// Below this magnitude cell text switches to exponent notation.
const MIN_PLAIN_MAGNITUDE: f64 = 1e-6;

/// A scalar cell of a flat record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// JSON integer too large for an f64, kept exactly as written.
    BigInteger(serde_json::Number),
    Bool(bool),
    Null,
    NoData,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(number) => Some(*number),
            FieldValue::BigInteger(number) => number.as_f64(),
            _ => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, FieldValue::NoData)
    }

    fn as_exact_integer(number: f64) -> Option<i64> {
        if number.fract() == 0.0 && number.abs() < MAX_EXACT_INTEGER {
            Some(number as i64)
        } else {
            None
        }
    }

    /// Numbers whose plain decimal form would be unreadably long are written in
    /// exponent notation.
    fn needs_exponent(number: f64) -> bool {
        let magnitude = number.abs();
        magnitude >= MAX_EXACT_INTEGER || (magnitude != 0.0 && magnitude < MIN_PLAIN_MAGNITUDE)
    }
}

impl From<&serde_json::Number> for FieldValue {
    fn from(number: &serde_json::Number) -> Self {
        let exact = match (number.as_i64(), number.as_u64()) {
            (Some(integer), _) => (integer.unsigned_abs() as f64) < MAX_EXACT_INTEGER,
            (None, Some(integer)) => (integer as f64) < MAX_EXACT_INTEGER,
            (None, None) => true,
        };
        match number.as_f64() {
            Some(value) if exact => FieldValue::Number(value),
            _ => FieldValue::BigInteger(number.clone()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Cell text for tabular output. `Null` renders as an empty cell.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Number(number) if FieldValue::needs_exponent(*number) => {
                write!(f, "{:e}", number)
            }
            FieldValue::Number(number) => write!(f, "{}", number),
            FieldValue::BigInteger(number) => write!(f, "{}", number),
            FieldValue::Bool(value) => write!(f, "{}", value),
            FieldValue::Null => Ok(()),
            FieldValue::NoData => write!(f, "{}", NO_DATA),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Number(number) => match FieldValue::as_exact_integer(*number) {
                Some(integer) => serializer.serialize_i64(integer),
                None => serializer.serialize_f64(*number),
            },
            FieldValue::BigInteger(number) => number.serialize(serializer),
            FieldValue::Bool(value) => serializer.serialize_bool(*value),
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

/// Single level key-value record, keys kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FlatRecord(IndexMap<String, FieldValue>);

impl FlatRecord {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rebuild the record so its keys are exactly `schema`, in that order.
    /// Keys missing from the record are filled with `NoData`.
    fn conform(&mut self, schema: &[String]) {
        let mut conformed = IndexMap::with_capacity(schema.len());
        for key in schema {
            let value = self.0.swap_remove(key).unwrap_or(FieldValue::NoData);
            conformed.insert(key.clone(), value);
        }
        self.0 = conformed;
    }
}

impl FromIterator<(String, FieldValue)> for FlatRecord {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ordered output of one conversion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<FlatRecord>);

impl RecordSet {
    pub fn new(records: Vec<FlatRecord>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[FlatRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The column order shared by every record after `normalize`.
    pub fn header(&self) -> Vec<&str> {
        match self.0.first() {
            Some(record) => record.keys().map(|key| key.as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Give every record the same keys in the same order: property keys as first seen,
    /// then the position keys, then the distance keys if any record has them.
    /// Absent values become `NoData`.
    pub fn normalize(&mut self) {
        let mut property_keys: IndexSet<String> = IndexSet::new();
        let mut has_geometry = false;
        let mut has_distance = false;
        for record in &self.0 {
            for key in record.keys() {
                if key.starts_with(PROPERTIES_PREFIX) {
                    property_keys.insert(key.clone());
                } else if GEOMETRY_KEYS.contains(&key.as_str()) {
                    has_geometry = true;
                } else if DISTANCE_KEYS.contains(&key.as_str()) {
                    has_distance = true;
                }
            }
        }

        let mut schema: Vec<String> = property_keys.into_iter().collect();
        if has_geometry {
            schema.extend(GEOMETRY_KEYS.iter().map(|key| key.to_string()));
        }
        if has_distance {
            schema.extend(DISTANCE_KEYS.iter().map(|key| key.to_string()));
        }

        for record in self.0.iter_mut() {
            record.conform(&schema);
        }
    }
}
