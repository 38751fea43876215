use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Provider selection or credential problems caught before any request
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport or upstream failure while talking to a provider
    #[error("provider error: {0}")]
    Provider(String),

    /// A response arrived but its body was unusable
    #[error("content error: {0}")]
    Content(String),

    /// Malformed input rejected before any network activity
    #[error("validation error: {0}")]
    Validation(String),

    /// A request is already in flight for this conversation
    #[error("still processing the previous request")]
    Busy,

    /// History persistence failed
    #[error("storage error: {0}")]
    Storage(String),

    /// The host document could not be read or written
    #[error("document error: {0}")]
    Document(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Provider("request timed out".to_string())
        } else if err.is_connect() {
            Error::Provider(format!("cannot reach provider: {err}"))
        } else if err.is_decode() {
            Error::Content(format!("response parse error: {err}"))
        } else {
            Error::Provider(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Content(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
