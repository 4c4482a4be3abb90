//! Error types for Ridgeway

use thiserror::Error;

/// The main error type for Ridgeway operations
#[derive(Debug, Error)]
pub enum RidgewayError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid road: {0}")]
    InvalidRoad(String),

    #[error("Value out of range: {field} must be between {min} and {max}, got {value}")]
    ValueOutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("Image error: {0}")]
    Image(String),
}

impl RidgewayError {
    /// Check that `value` lies in `[min, max]`, naming `field` in the error.
    pub fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
        if value.is_finite() && value >= min && value <= max {
            Ok(())
        } else {
            Err(RidgewayError::ValueOutOfRange {
                field: field.to_string(),
                min,
                max,
                value,
            })
        }
    }
}

/// Result type alias for Ridgeway operations
pub type Result<T> = std::result::Result<T, RidgewayError>;

impl From<toml::de::Error> for RidgewayError {
    fn from(err: toml::de::Error) -> Self {
        RidgewayError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for RidgewayError {
    fn from(err: toml::ser::Error) -> Self {
        RidgewayError::TomlSer(err.to_string())
    }
}
