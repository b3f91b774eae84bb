use geojson::FeatureCollection;
use rayon::prelude::*;
use serde::Deserialize;

use super::record::{FlatRecord, RecordSet};
use crate::{
    error::ConversionError,
    geofile::{feature::flatten_properties, geojson::parse_feature_collection},
    geometry::{
        augment::{Augmenter, CumulativeScope, Layout},
        distance::DistanceFormula,
    },
};

/// Choices that shape the records of a conversion.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ConversionOptions {
    pub distance_formula: DistanceFormula,
    pub layout: Layout,
    pub cumulative_scope: CumulativeScope,
}

impl ConversionOptions {
    fn augmenter(&self) -> Augmenter<DistanceFormula> {
        Augmenter {
            distance: self.distance_formula,
            layout: self.layout,
            cumulative_scope: self.cumulative_scope,
        }
    }
}

/// Flatten every feature of the collection and add its position and distance fields.
///
/// Features are processed in parallel and their records concatenated in input order.
/// The returned records all share one key set. The set may be empty.
pub fn convert_collection(
    collection: &FeatureCollection,
    options: &ConversionOptions,
) -> Result<RecordSet, ConversionError> {
    let augmenter = options.augmenter();
    let per_feature: Vec<Vec<FlatRecord>> = collection
        .features
        .par_iter()
        .enumerate()
        .map(|(index, feature)| -> Result<Vec<FlatRecord>, ConversionError> {
            let base = flatten_properties(feature.properties.as_ref());
            let records = augmenter.augment(index, feature.geometry.as_ref(), &base)?;
            log::debug!("Feature {} produced {} records", index, records.len());
            Ok(records)
        })
        .collect::<Result<_, _>>()?;

    let mut records = RecordSet::new(per_feature.into_iter().flatten().collect());
    records.normalize();
    Ok(records)
}

/// Parse GeoJSON text and convert it.
pub fn convert_str(text: &str, options: &ConversionOptions) -> Result<RecordSet, ConversionError> {
    let collection = parse_feature_collection(text)?;
    convert_collection(&collection, options)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::{convert_str, ConversionOptions};
    use crate::{
        error::ConversionError,
        geometry::{augment::Layout, distance::DistanceFormula},
        tabular::record::*,
    };

    const MIXED: &str = r#"{"features": [
        {"properties": {"Station": "A"}, "geometry": null},
        {"properties": {"Station": "B", "Km": 4}, "geometry": {"type": "LineString", "coordinates": [[0, 0], [0, 1], [0, 2]]}},
        {"properties": {"Station": "C"}, "geometry": {"type": "LineString", "coordinates": [[3, 3]]}},
        {"properties": {"Station": "D"}, "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1], [0, 0]]]}}
    ]}"#;

    #[test]
    fn test_round_trip_scenario() {
        let text = r#"{"features":[{"properties":{"Station":"A"},"geometry":{"type":"LineString","coordinates":[[0,0],[0,1]]}}]}"#;
        let records = convert_str(text, &ConversionOptions::default()).unwrap();

        assert_eq!(1, records.len());
        let record = &records.records()[0];
        assert_eq!(
            Some(&FieldValue::Text("A".to_string())),
            record.get("Properties.Station")
        );
        assert_eq!(Some(1.0), record.get(END_LATITUDE).unwrap().as_f64());
        let distance = record.get(DISTANCE_KM).unwrap().as_f64().unwrap();
        assert_abs_diff_eq!(111.19, distance, epsilon = 0.01);
        assert_eq!(
            Some(distance),
            record.get(CUMULATIVE_DISTANCE_KM).unwrap().as_f64()
        );
    }

    #[test]
    fn test_no_data_scenario() {
        let records = convert_str(
            r#"{"features":[{"properties":{},"geometry":null}]}"#,
            &ConversionOptions::default(),
        )
        .unwrap();

        assert_eq!(1, records.len());
        assert_eq!(GEOMETRY_KEYS.to_vec(), records.header());
        for key in GEOMETRY_KEYS {
            assert!(records.records()[0].get(key).unwrap().is_no_data());
        }
    }

    #[test]
    fn test_empty_collection() {
        let records = convert_str(r#"{"features":[]}"#, &ConversionOptions::default()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_mixed_collection_has_uniform_keys() {
        let records = convert_str(MIXED, &ConversionOptions::default()).unwrap();

        // 1 placeholder, 2 segments, none for the single point, 3 ring edges.
        assert_eq!(6, records.len());
        let header = records.header();
        for record in records.records() {
            let keys: Vec<&str> = record.keys().map(|key| key.as_str()).collect();
            assert_eq!(header, keys);
        }
        let stations: Vec<String> = records
            .records()
            .iter()
            .map(|record| record.get("Properties.Station").unwrap().to_string())
            .collect();
        assert_eq!(vec!["A", "B", "B", "D", "D", "D"], stations);
        // The placeholder record is padded for the columns other features brought in.
        let placeholder = &records.records()[0];
        assert!(placeholder.get("Properties.Km").unwrap().is_no_data());
        assert!(placeholder.get(DISTANCE_MILES).unwrap().is_no_data());
    }

    #[rstest]
    #[case(Layout::Segments, 6)]
    #[case(Layout::Endpoints, 4)]
    fn test_layouts(#[case] layout: Layout, #[case] expected_len: usize) {
        let options = ConversionOptions {
            layout,
            ..Default::default()
        };
        assert_eq!(expected_len, convert_str(MIXED, &options).unwrap().len());
    }

    #[test]
    fn test_conversion_is_repeatable() {
        let options = ConversionOptions {
            distance_formula: DistanceFormula::CentralAngle,
            ..Default::default()
        };
        assert_eq!(
            convert_str(MIXED, &options).unwrap(),
            convert_str(MIXED, &options).unwrap()
        );
    }

    #[test]
    fn test_unsupported_geometry_fails_conversion() {
        let text = r#"{"features":[{"properties":{},"geometry":{"type":"Point","coordinates":[1,2]}}]}"#;
        let result = convert_str(text, &ConversionOptions::default());
        assert!(matches!(
            result,
            Err(ConversionError::UnsupportedGeometryType { feature: 0, .. })
        ));
    }

    #[test]
    fn test_options_from_yaml() {
        let options: ConversionOptions =
            serde_yaml::from_str("distance_formula: equirectangular\nlayout: endpoints").unwrap();
        assert_eq!(DistanceFormula::Equirectangular, options.distance_formula);
        assert_eq!(Layout::Endpoints, options.layout);
        assert_eq!(
            ConversionOptions::default().cumulative_scope,
            options.cumulative_scope
        );
    }
}
