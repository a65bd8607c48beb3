use std::error::Error as StdError;

/// Crate-wide result type for courier operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared across the directory and flow crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database read or write failed.
    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    /// Integer parsing failed (malformed action payload).
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),

    /// A platform call (send, edit, forward, metadata lookup) failed.
    #[error("transport operation failed: {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn transport(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
