use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced around a streaming session.
///
/// Extraction and emission tracking never fail; these variants describe
/// what the caller or the upstream model can get wrong.
#[derive(Debug, Error)]
pub enum Error {
    /// The conversation carried no usable text. Don't retry, fix the input.
    #[error("no input message found")]
    NoInput,
    /// The snapshot stream broke off mid-generation.
    #[error("stream aborted: {0}")]
    Stream(String),
    /// The model refused or failed to start generating.
    #[error("model error: {0}")]
    Model(String),
}

impl Error {
    /// Create a [`Stream`](Error::Stream) error.
    pub fn stream(msg: impl Into<String>) -> Self {
        Error::Stream(msg.into())
    }

    /// Create a [`Model`](Error::Model) error.
    pub fn model(msg: impl Into<String>) -> Self {
        Error::Model(msg.into())
    }
}
