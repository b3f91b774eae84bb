use geo::Coord;
use geojson::{Geometry, Value};
use serde::Deserialize;

use super::distance::{DistanceFn, MILES_PER_METER};
use crate::{
    error::ConversionError,
    tabular::record::{
        FieldValue, FlatRecord, CUMULATIVE_DISTANCE_KM, CUMULATIVE_DISTANCE_MILES, DISTANCE_KM,
        DISTANCE_MILES, END_LATITUDE, END_LONGITUDE, START_LATITUDE, START_LONGITUDE,
    },
};

/// Where the running distance total restarts.
#[derive(Deserialize, clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CumulativeScope {
    /// Once per feature, carried across all rings or lines of the feature.
    #[default]
    Feature,
    /// At the start of every ring or line.
    Part,
}

/// How many records a feature produces.
#[derive(Deserialize, clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One record per pair of consecutive coordinates.
    #[default]
    Segments,
    /// One record per feature from its first to its last coordinate.
    Endpoints,
}

/// Adds position and distance fields to the flattened properties of a feature.
#[derive(Debug, Clone)]
pub struct Augmenter<D: DistanceFn> {
    pub distance: D,
    pub layout: Layout,
    pub cumulative_scope: CumulativeScope,
}

impl<D: DistanceFn> Augmenter<D> {
    pub fn new(distance: D) -> Self {
        Self {
            distance,
            layout: Layout::default(),
            cumulative_scope: CumulativeScope::default(),
        }
    }

    /// Produce the output records for feature number `feature`, each one a copy of `base`
    /// extended with position fields, and distance fields when any were computed.
    ///
    /// A missing geometry or one without coordinates gives a single record with `No Data`
    /// positions. In the segments layout a geometry whose parts hold at most one coordinate
    /// each gives no records at all.
    pub fn augment(
        &self,
        feature: usize,
        geometry: Option<&Geometry>,
        base: &FlatRecord,
    ) -> Result<Vec<FlatRecord>, ConversionError> {
        let parts = match geometry {
            Some(geometry) => coordinate_parts(feature, &geometry.value)?,
            None => Vec::new(),
        };
        if parts.iter().all(|part| part.is_empty()) {
            return Ok(vec![no_data_record(base)]);
        }

        let records = match self.layout {
            Layout::Segments => self.segment_records(&parts, base),
            Layout::Endpoints => vec![self.endpoint_record(&parts, base)],
        };
        if records.is_empty() {
            log::warn!(
                "Feature {} has no coordinate pairs, no segments were emitted for it",
                feature
            );
        }
        Ok(records)
    }

    fn segment_records(&self, parts: &[Vec<Coord>], base: &FlatRecord) -> Vec<FlatRecord> {
        let mut records = Vec::new();
        let mut cumulative = 0.0;
        for part in parts {
            if self.cumulative_scope == CumulativeScope::Part {
                cumulative = 0.0;
            }
            for pair in part.windows(2) {
                let distance = self.distance.distance_m(pair[0], pair[1]);
                cumulative += distance;
                records.push(segment_record(base, pair[0], pair[1], distance, cumulative));
            }
        }
        records
    }

    fn endpoint_record(&self, parts: &[Vec<Coord>], base: &FlatRecord) -> FlatRecord {
        let (Some(first), Some(last)) = (
            parts.iter().flatten().next(),
            parts.iter().flatten().last(),
        ) else {
            return no_data_record(base);
        };
        let length: f64 = parts
            .iter()
            .flat_map(|part| part.windows(2))
            .map(|pair| self.distance.distance_m(pair[0], pair[1]))
            .sum();
        segment_record(base, *first, *last, length, length)
    }
}

/// The coordinate sequences of a geometry: the line of a LineString, the lines of a
/// MultiLineString, or the rings of a Polygon or MultiPolygon, in document order.
pub fn coordinate_parts(feature: usize, value: &Value) -> Result<Vec<Vec<Coord>>, ConversionError> {
    match value {
        Value::LineString(line) => Ok(vec![to_part(feature, line)?]),
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines
            .iter()
            .map(|line| to_part(feature, line))
            .collect(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .map(|ring| to_part(feature, ring))
            .collect(),
        Value::Point(_) | Value::MultiPoint(_) | Value::GeometryCollection(_) => {
            Err(ConversionError::UnsupportedGeometryType {
                feature,
                kind: geometry_kind(value).to_string(),
            })
        }
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn to_part(feature: usize, positions: &[Vec<f64>]) -> Result<Vec<Coord>, ConversionError> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(ConversionError::MalformedFeature {
                feature,
                reason: format!("Position {:?} has fewer than two ordinates", position),
            }),
        })
        .collect()
}

fn no_data_record(base: &FlatRecord) -> FlatRecord {
    let mut record = base.clone();
    for key in [START_LATITUDE, START_LONGITUDE, END_LATITUDE, END_LONGITUDE] {
        record.insert(key, FieldValue::NoData);
    }
    record
}

fn segment_record(
    base: &FlatRecord,
    start: Coord,
    end: Coord,
    distance_m: f64,
    cumulative_m: f64,
) -> FlatRecord {
    let mut record = base.clone();
    record.insert(START_LATITUDE, start.y);
    record.insert(START_LONGITUDE, start.x);
    record.insert(END_LATITUDE, end.y);
    record.insert(END_LONGITUDE, end.x);
    record.insert(DISTANCE_KM, distance_m / 1000.0);
    record.insert(CUMULATIVE_DISTANCE_KM, cumulative_m / 1000.0);
    record.insert(DISTANCE_MILES, distance_m * MILES_PER_METER);
    record.insert(CUMULATIVE_DISTANCE_MILES, cumulative_m * MILES_PER_METER);
    record
}
