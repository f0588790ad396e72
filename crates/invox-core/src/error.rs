//! Error types for the invox-core library.

use thiserror::Error;

/// Main error type for the invox library.
#[derive(Error, Debug)]
pub enum InvoxError {
    /// Configuration or settings error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The image source could not be turned into a request.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// The extraction call failed or returned unusable data.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Illegal session transition.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration and stored settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No API key was supplied.
    #[error("no API key configured; run `invox key set <KEY>` or set GEMINI_API_KEY")]
    MissingCredential,

    /// The model identifier is not one of the supported choices.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The configuration file or a value in it is invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors related to the image handed to the request builder.
#[derive(Error, Debug)]
pub enum RequestError {
    /// The file is not a supported image or PDF.
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    /// The file exceeds the inline payload limit.
    #[error("file is too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// The file has no content.
    #[error("file is empty: {0}")]
    Empty(String),
}

/// Errors raised by the extraction client.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The HTTP call itself failed.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The model API answered with an error.
    #[error("model API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response text does not match the expected invoice shape.
    #[error("response did not match the invoice schema: {reason}")]
    Shape { reason: String, raw: String },
}

/// Errors raised by illegal session transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Extraction requested with no file selected.
    #[error("no file selected")]
    NoFile,

    /// An extraction is already in flight.
    #[error("an extraction is already in progress")]
    Busy,

    /// A result was delivered while nothing was in flight.
    #[error("no extraction in progress")]
    NotProcessing,

    /// Extraction requested without a credential.
    #[error("no API key configured")]
    MissingCredential,
}

/// Result type for the invox library.
pub type Result<T> = std::result::Result<T, InvoxError>;
