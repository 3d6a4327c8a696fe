use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Calendar API error: {0}")]
    #[diagnostic(code(time_spent::api))]
    Api(String),

    #[error("Unknown calendar: {0}")]
    #[diagnostic(
        code(time_spent::unknown_calendar),
        help("The aggregated data references a calendar that was not in the calendar list")
    )]
    UnknownCalendar(String),

    #[error("Parse error: {0}")]
    #[diagnostic(code(time_spent::parse), help("Dates must be given as YYYY-MM-DD"))]
    Parse(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(time_spent::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(time_spent::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(time_spent::io))]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    #[diagnostic(code(time_spent::image))]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(time_spent::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(time_spent::other))]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type ReportResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create calendar API errors
pub fn api_error(message: &str) -> Error {
    Error::Api(message.to_string())
}

/// Helper to create parse errors
pub fn parse_error(message: &str) -> Error {
    Error::Parse(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
