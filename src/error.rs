use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid parameter '{name}': {details}")]
    InvalidParameter { name: String, details: String },

    #[error("Invalid analytics configuration: {0}")]
    InvalidConfig(String),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Extracted document is missing required field: {0}")]
    MissingField(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub(crate) fn invalid_parameter(name: &str, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
