/// All errors that can occur while talking to the EventHub backend.
///
/// Every variant renders to a single human-readable message through
/// [`ApiError::message`]; that string is what the store surfaces to readers.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// The request never produced a response (network, DNS, TLS, etc.).
    #[error("{message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success HTTP status.
    #[error("{message}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        message: String,
    },

    /// Legacy endpoint answered 2xx but with `ok: false` in the body.
    #[error("{message}")]
    Rejected { url: String, message: String },

    /// Response body could not be decoded into the expected shape.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    /// A request payload could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// A display-formatted date could not be parsed back.
    #[error("invalid date {input:?}, expected DD.MM.YYYY")]
    Date {
        input: String,
        source: chrono::ParseError,
    },

    /// An event could not be read back from the cache after fetching it.
    #[error("event {id} is not available")]
    EventUnavailable { id: u64 },

    /// A mutation succeeded but the backend did not hand back the created id.
    #[error("response from {url} is missing field `{field}`")]
    MissingField { url: String, field: &'static str },
}

impl ApiError {
    /// The single message shown to users for this error.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status of the failed response, when there was one.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
