use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum FetchError {
    #[error("The HTTP request failed with status code {0}. Body: {1}")]
    RequestFailed(u16, String),
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedUrlScheme(String),
    #[error("Invalid file path: {0}")]
    InvalidFilePath(String),
    #[error("Invalid Content-Length header (not an integer): {0}")]
    InvalidLength(#[from] std::num::ParseIntError),
    #[error(transparent)]
    HTTP(#[from] ureq::Error),
    #[error(transparent)]
    IO(#[from] std::io::Error),
}
