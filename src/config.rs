use std::{fs::read_to_string, path::Path, path::PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::tabular::{convert::ConversionOptions, emit::OutputFormat};

#[derive(Deserialize, Debug)]
pub struct Config {
    /// GeoJSON files to convert.
    pub inputs: Vec<PathBuf>,
    /// Directory receiving one output file per input.
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(flatten)]
    pub conversion: ConversionOptions,
}

pub fn load_config(filepath: &Path) -> anyhow::Result<Config> {
    if !filepath.exists() {
        return Err(anyhow!("Config file {:?} not found", filepath));
    }
    let config_contents = read_to_string(filepath)?;
    serde_yaml::from_str(&config_contents)
        .with_context(|| format!("Parsing config file {:?}", filepath))
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use testdir::testdir;

    use super::load_config;
    use crate::{
        geometry::{
            augment::{CumulativeScope, Layout},
            distance::DistanceFormula,
        },
        tabular::emit::OutputFormat,
    };

    #[test]
    fn test_load_full_config() {
        let test_dir = testdir!();
        let config_filepath = test_dir.join("config.yaml");
        fs::write(
            &config_filepath,
            "inputs: [tracks/route.geojson, tracks/site.geojson]\n\
             output_dir: out\n\
             format: json\n\
             distance_formula: central_angle\n\
             layout: endpoints\n\
             cumulative_scope: part\n",
        )
        .unwrap();

        let config = load_config(&config_filepath).unwrap();
        assert_eq!(
            vec![
                PathBuf::from("tracks/route.geojson"),
                PathBuf::from("tracks/site.geojson")
            ],
            config.inputs
        );
        assert_eq!(PathBuf::from("out"), config.output_dir);
        assert_eq!(OutputFormat::Json, config.format);
        assert_eq!(DistanceFormula::CentralAngle, config.conversion.distance_formula);
        assert_eq!(Layout::Endpoints, config.conversion.layout);
        assert_eq!(CumulativeScope::Part, config.conversion.cumulative_scope);
    }

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let test_dir = testdir!();
        let config_filepath = test_dir.join("config.yaml");
        fs::write(&config_filepath, "inputs: []\noutput_dir: out\n").unwrap();

        let config = load_config(&config_filepath).unwrap();
        assert!(config.inputs.is_empty());
        assert_eq!(OutputFormat::Csv, config.format);
        assert_eq!(DistanceFormula::Haversine, config.conversion.distance_formula);
        assert_eq!(Layout::Segments, config.conversion.layout);
        assert_eq!(CumulativeScope::Feature, config.conversion.cumulative_scope);
    }

    #[test]
    fn test_missing_config_file() {
        let test_dir = testdir!();
        let err = load_config(&test_dir.join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_config() {
        let test_dir = testdir!();
        let config_filepath = test_dir.join("config.yaml");
        fs::write(&config_filepath, "inputs: []\noutput_dir: out\nformat: xlsx\n").unwrap();
        assert!(load_config(&config_filepath).is_err());
    }
}
