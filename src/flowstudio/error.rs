use thiserror::Error;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Transport-level failure (DNS, connect, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// The server answered with a non-success status.
    #[error("HTTP error: {status} - {body}")]
    HttpStatus { status: u16, body: String },

    #[error("AI provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl StudioError {
    /// True when a remote answered but the payload could not be understood.
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self, StudioError::Serialization(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StudioError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;
