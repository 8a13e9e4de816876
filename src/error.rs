use thiserror::Error;

/// The result type returned from the library.
pub type Result<T> = std::result::Result<T, HeadwayError>;

/// The error type returned from the library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HeadwayError {
    /// A [`Ticker`](crate::Ticker) was started with an interval of zero.
    #[error("The tick interval must be longer than zero")]
    ZeroInterval,

    /// Transparent wrapper for a [`std::io::Error`].
    #[error(transparent)]
    IO(#[from] std::io::Error),
}
