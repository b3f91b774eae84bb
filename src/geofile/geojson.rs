use std::{fs, path::Path};

use geojson::{FeatureCollection, GeoJson};
use serde_json::Value;

use crate::error::ConversionError;

const FEATURE_COLLECTION: &str = "FeatureCollection";

/// Parse a GeoJSON FeatureCollection.
///
/// Uploads are not always strict GeoJSON, so a missing `type` member is assumed to be
/// `FeatureCollection` at the top level and `Feature` on each feature, and a feature
/// without `geometry` is read as having a null geometry.
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, ConversionError> {
    let mut document: Value = serde_json::from_str(text)?;
    fill_missing_members(&mut document)?;
    match GeoJson::from_json_value(document)? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        _ => Err(ConversionError::MalformedInput(
            "Expected a FeatureCollection".to_string(),
        )),
    }
}

pub fn read_feature_collection(filepath: &Path) -> Result<FeatureCollection, ConversionError> {
    let contents = fs::read_to_string(filepath)?;
    parse_feature_collection(&contents)
}

fn fill_missing_members(document: &mut Value) -> Result<(), ConversionError> {
    let object = document.as_object_mut().ok_or_else(|| {
        ConversionError::MalformedInput("Expected a JSON object at the top level".to_string())
    })?;

    let kind = object
        .entry("type")
        .or_insert_with(|| Value::from(FEATURE_COLLECTION));
    if kind.as_str() != Some(FEATURE_COLLECTION) {
        return Err(ConversionError::MalformedInput(format!(
            "Expected a FeatureCollection, found type {}",
            kind
        )));
    }

    let features = object
        .get_mut("features")
        .ok_or_else(|| ConversionError::MalformedInput("Missing `features` member".to_string()))?
        .as_array_mut()
        .ok_or_else(|| ConversionError::MalformedInput("`features` is not an array".to_string()))?;
    for feature in features.iter_mut() {
        if let Some(feature) = feature.as_object_mut() {
            feature
                .entry("type")
                .or_insert_with(|| Value::from("Feature"));
            feature.entry("geometry").or_insert(Value::Null);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rstest::rstest;
    use testdir::testdir;

    use super::{parse_feature_collection, read_feature_collection};
    use crate::error::ConversionError;

    #[test]
    fn test_parse_strict_geojson() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"Station": "A"},
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 1.0]]}
            }]
        }"#;
        let collection = parse_feature_collection(text).unwrap();
        assert_eq!(1, collection.features.len());
        assert!(collection.features[0].geometry.is_some());
    }

    #[test]
    fn test_parse_untyped_upload() {
        let text = r#"{"features": [
            {"properties": {"Station": "A"}, "geometry": {"type": "LineString", "coordinates": [[0, 0], [0, 1]]}},
            {"properties": {}, "geometry": null},
            {"properties": {"Station": "C"}}
        ]}"#;
        let collection = parse_feature_collection(text).unwrap();
        assert_eq!(3, collection.features.len());
        assert!(collection.features[1].geometry.is_none());
        assert!(collection.features[2].geometry.is_none());
    }

    #[rstest]
    #[case("{}")]
    #[case(r#"{"type": "FeatureCollection"}"#)]
    #[case(r#"{"features": {}}"#)]
    #[case(r#"{"type": "Feature", "features": []}"#)]
    #[case("[]")]
    #[case("not json")]
    #[case(r#"{"features": [{"geometry": {"coordinates": [[0, 0]]}}]}"#)]
    fn test_malformed_input(#[case] text: &str) {
        let result = parse_feature_collection(text);
        assert!(
            matches!(result, Err(ConversionError::MalformedInput(_))),
            "{:?}",
            result
        );
    }

    #[test]
    fn test_read_from_file() {
        let test_dir = testdir!();
        let filepath = test_dir.join("route.geojson");
        fs::write(&filepath, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        let collection = read_feature_collection(&filepath).unwrap();
        assert!(collection.features.is_empty());
    }

    #[test]
    fn test_read_missing_file() {
        let test_dir = testdir!();
        let result = read_feature_collection(&test_dir.join("missing.geojson"));
        assert!(matches!(result, Err(ConversionError::Io(_))));
    }
}
