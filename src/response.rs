use serde_json::json;

use crate::{
    error::ConversionError,
    tabular::{
        convert::{convert_str, ConversionOptions},
        emit::{render, suggested_stem, OutputFormat, Rendered},
    },
};

const JSON_CONTENT_TYPE: &str = "application/json";

/// What a request handler sends back for one uploaded GeoJSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResponse {
    pub status: u16,
    pub content_type: &'static str,
    /// Suggested download name, only set on success.
    pub file_name: Option<String>,
    pub body: String,
}

/// Convert an uploaded GeoJSON document and turn the outcome into a response.
///
/// Failures never escape: an empty result answers `{"message": ...}`, other errors
/// answer `{"msg": ...}` with the status code of the error.
pub fn respond(
    input: &str,
    upload_name: &str,
    options: &ConversionOptions,
    format: OutputFormat,
) -> ConversionResponse {
    match convert_and_render(input, options, format) {
        Ok(rendered) => ConversionResponse {
            status: 200,
            content_type: rendered.content_type(),
            file_name: Some(rendered.file_name(&suggested_stem(upload_name))),
            body: rendered.body,
        },
        Err(err) => error_response(upload_name, &err),
    }
}

fn convert_and_render(
    input: &str,
    options: &ConversionOptions,
    format: OutputFormat,
) -> Result<Rendered, ConversionError> {
    let records = convert_str(input, options)?;
    render(&records, format)
}

fn error_response(upload_name: &str, err: &ConversionError) -> ConversionResponse {
    let body = match err {
        ConversionError::EmptyResult => {
            log::warn!("{}: {}", upload_name, err);
            json!({ "message": err.to_string() })
        }
        _ if err.is_recoverable() => {
            log::warn!("Rejected {}: {}", upload_name, err);
            json!({ "msg": err.to_string() })
        }
        _ => {
            log::error!("Could not convert {}: {}", upload_name, err);
            json!({ "msg": err.to_string() })
        }
    };
    ConversionResponse {
        status: err.status_code(),
        content_type: JSON_CONTENT_TYPE,
        file_name: None,
        body: body.to_string(),
    }
}
