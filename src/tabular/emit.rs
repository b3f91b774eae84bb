use std::{io, path::Path};

use serde::Deserialize;

use super::record::{RecordSet, NO_DATA};
use crate::error::ConversionError;

const DEFAULT_FILE_STEM: &str = "export";

#[derive(Deserialize, clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "text/csv",
            OutputFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// A rendered record set, ready to be written or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub format: OutputFormat,
    pub body: String,
}

impl Rendered {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Suggested download name, e.g. `route.csv` for the stem `route`.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.{}", stem, self.format.extension())
    }
}

/// Render the records in the given format. An empty record set is reported as
/// `EmptyResult`.
pub fn render(records: &RecordSet, format: OutputFormat) -> Result<Rendered, ConversionError> {
    if records.is_empty() {
        return Err(ConversionError::EmptyResult);
    }
    let body = match format {
        OutputFormat::Csv => render_csv(records)?,
        OutputFormat::Json => render_json(records)?,
    };
    Ok(Rendered { format, body })
}

/// CSV with a header row taken from the keys of the first record.
pub fn render_csv(records: &RecordSet) -> Result<String, ConversionError> {
    let header = records.header();
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for record in records.records() {
        writer.write_record(header.iter().map(|key| match record.get(key) {
            Some(value) => value.to_string(),
            None => NO_DATA.to_string(),
        }))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ConversionError::Io(err.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|err| ConversionError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
}

/// JSON array with one object per record.
pub fn render_json(records: &RecordSet) -> Result<String, ConversionError> {
    serde_json::to_string_pretty(records).map_err(|err| ConversionError::Io(err.into()))
}

/// File name stem for the output of an upload or input file, `export` if there is none.
pub fn suggested_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_FILE_STEM)
        .to_string()
}
