pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Provider returned status {status}: {body}")]
    ProviderError {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("Unexpected response: {0}")]
    InvalidResponse(&'static str),
}
