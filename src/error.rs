/// Failures of a single conversion call.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Malformed feature {feature}: {reason}")]
    MalformedFeature { feature: usize, reason: String },

    #[error("Feature {feature} has unsupported geometry type {kind}")]
    UnsupportedGeometryType { feature: usize, kind: String },

    #[error("No data / Something went wrong")]
    EmptyResult,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Whether the caller should report this outcome instead of failing hard.
    /// Only transport level failures (CSV writer, IO) are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ConversionError::Csv(_) | ConversionError::Io(_))
    }

    /// HTTP status a request boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ConversionError::EmptyResult => 200,
            ConversionError::MalformedInput(_) | ConversionError::MalformedFeature { .. } => 400,
            ConversionError::UnsupportedGeometryType { .. } => 422,
            ConversionError::Csv(_) | ConversionError::Io(_) => 500,
        }
    }
}

impl From<serde_json::Error> for ConversionError {
    fn from(err: serde_json::Error) -> Self {
        ConversionError::MalformedInput(format!("Invalid JSON, {}", err))
    }
}

impl From<geojson::Error> for ConversionError {
    fn from(err: geojson::Error) -> Self {
        ConversionError::MalformedInput(format!("Invalid GeoJSON, {}", err))
    }
}
