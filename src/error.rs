#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum MedSafeError {
    #[error("HTTP client initialization failed: {0}")]
    HttpClientInit(reqwest::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP middleware error: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    #[error("API error from {api}: {message}")]
    Api { api: String, message: String },

    #[error("API JSON error from {api}: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected response shape from {api}: {message}")]
    Schema { api: String, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MedSafeError {
    /// True when the upstream answered but the payload could not be used.
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            Self::ApiJson { .. } | Self::Schema { .. } | Self::Json(_)
        )
    }
}
