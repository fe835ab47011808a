use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Metric '{key}' is a {existing}, not a {requested}")]
    KindMismatch {
        key: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Capability probe failed: {0}")]
    CapabilityProbe(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScaleError>;
