//! Store-specific error type wrapping reqwest errors.

use nexushub_domain::error::NexusError;

/// Errors originating from the REST store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The request could not be sent or its body could not be read.
    #[error("http transport error")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// The response body was not a JSON array.
    #[error("malformed {collection} collection")]
    Decode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot be used.
    #[error("invalid store url")]
    Url(#[from] url::ParseError),
}

impl StoreError {
    /// Wrap into the domain's storage error.
    #[must_use]
    pub fn into_domain(self) -> NexusError {
        NexusError::Storage(Box::new(self))
    }
}

impl From<StoreError> for NexusError {
    fn from(err: StoreError) -> Self {
        err.into_domain()
    }
}
