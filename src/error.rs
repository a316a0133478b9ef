use thiserror::Error;

/// Failure of a single call to one of the remote APIs.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The platform answered 200 but reported failure in the envelope.
    #[error("api error: {0}")]
    Api(String),

    #[error("undecodable response: {0}")]
    Decode(String),
}
