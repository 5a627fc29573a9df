use thiserror::Error;

/// Errors that can occur while retrieving content from the remote API
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{field} is required")]
    MissingInput { field: &'static str },

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Endpoint not found or service domain is invalid")]
    NotFound,

    #[error("Too many requests. Please try again later")]
    RateLimited,

    #[error("Server error: {status}")]
    Server { status: u16 },

    #[error("API error: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP {status}")]
    Status { status: u16 },

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response structure: {message}")]
    InvalidStructure { message: String },

    #[error("Fetch ended before a final result was produced")]
    Incomplete,
}

/// Result type alias for content fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
