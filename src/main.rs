extern crate log;
use anyhow::{anyhow, Context};
use clap::Parser;
use geo_tabulate::config::{load_config, Config};
use geo_tabulate::error::ConversionError;
use geo_tabulate::geofile::geojson::read_feature_collection;
use geo_tabulate::geometry::augment::{CumulativeScope, Layout};
use geo_tabulate::geometry::distance::DistanceFormula;
use geo_tabulate::tabular::convert::convert_collection;
use geo_tabulate::tabular::emit::{render, suggested_stem, OutputFormat};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};

/// Convert GeoJSON FeatureCollections into flat CSV or JSON tables with segment distances.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: PathBuf,

    /// Output format, overrides the config file.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Distance formula, overrides the config file.
    #[arg(long, value_enum)]
    distance_formula: Option<DistanceFormula>,

    /// Record layout, overrides the config file.
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Where the cumulative distance restarts, overrides the config file.
    #[arg(long, value_enum)]
    cumulative_scope: Option<CumulativeScope>,
}

/// Convert one input file. Returns the written path, or None when the input had no records.
fn convert_file(input: &Path, config: &Config) -> anyhow::Result<Option<PathBuf>> {
    let collection = read_feature_collection(input)
        .with_context(|| format!("Reading GeoJSON from {:?}", input))?;
    let records = convert_collection(&collection, &config.conversion)?;
    log::debug!(
        "{} features of {:?} gave {} records",
        collection.features.len(),
        input,
        records.len()
    );

    let rendered = match render(&records, config.format) {
        Ok(rendered) => rendered,
        Err(ConversionError::EmptyResult) => {
            log::warn!("{:?}: {}", input, ConversionError::EmptyResult);
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    let stem = suggested_stem(&input.to_string_lossy());
    let output_filepath = config.output_dir.join(rendered.file_name(&stem));
    fs::write(&output_filepath, rendered.body)
        .with_context(|| format!("Writing {:?}", output_filepath))?;
    Ok(Some(output_filepath))
}

/// Command line flags take precedence over the config file.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(format) = args.format {
        config.format = format;
    }
    if let Some(distance_formula) = args.distance_formula {
        config.conversion.distance_formula = distance_formula;
    }
    if let Some(layout) = args.layout {
        config.conversion.layout = layout;
    }
    if let Some(cumulative_scope) = args.cumulative_scope {
        config.conversion.cumulative_scope = cumulative_scope;
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = load_config(&args.config_filepath)?;
    apply_overrides(&mut config, &args);
    log::info!("Using {:?}", config.conversion);

    fs::create_dir_all(&config.output_dir)?;

    let mut failures = 0;
    let bar = ProgressBar::new(config.inputs.len() as u64);
    for input in &config.inputs {
        match convert_file(input, &config) {
            Ok(Some(output_filepath)) => log::info!("Wrote {:?}", output_filepath),
            Ok(None) => {}
            Err(err) => {
                log::error!("Could not convert {:?}: {:?}", input, err);
                failures += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish();

    if failures > 0 {
        return Err(anyhow!(
            "{} of {} inputs could not be converted",
            failures,
            config.inputs.len()
        ));
    }
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
