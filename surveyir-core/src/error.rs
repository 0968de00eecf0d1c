use thiserror::Error;

/// Errors raised by layout collaborators and by engine construction.
///
/// Structural defects inside a well-formed layout are never errors; they
/// are recorded in the IR's diagnostics instead.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON layout error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XHTML layout error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed layout: {0}")]
    LayoutFormat(String),

    #[error("Table extraction failed on page {page}: {message}")]
    TableExtraction { page: u32, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
