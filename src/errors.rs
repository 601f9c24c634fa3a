use thiserror::Error;

/// Errors produced while filling a templated deck.
#[derive(Error, Debug)]
pub enum FillError {
    /// Error originating from the underlying HTTP client (`reqwest`).
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Error during serialization or deserialization of a remote payload.
    #[error("Failed to (de)serialize JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// An error reported by the presentation store itself (non-2xx status).
    #[error("Store returned an error: Status {status}, Message: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Authentication or authorization failure against the presentation store.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The requested document does not exist or is not visible to the caller.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Invalid input provided to a pipeline function.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The mapping configuration could not be loaded or is malformed.
    #[error("Mapping configuration error: {0}")]
    MappingConfig(String),

    /// Decoding or re-encoding an image artifact failed.
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// An error related to reading environment variables.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// An I/O error, usually while reading a local asset or config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FillError {
    /// Whether this error must abort the whole run.
    ///
    /// Auth and not-found failures are unrecoverable; everything else is a
    /// per-placeholder degradation handled by the orchestrator.
    pub fn is_fatal(&self) -> bool {
        match self {
            FillError::Auth(_) | FillError::DocumentNotFound(_) => true,
            FillError::Api { status, .. } => {
                status.as_u16() == 401 || status.as_u16() == 403 || status.as_u16() == 404
            }
            _ => false,
        }
    }
}

/// A type alias for `Result<T, FillError>` for convenience within the crate.
pub type Result<T> = std::result::Result<T, FillError>;
