use thiserror::Error;

/// Failure of a single logical HTTP call, after any retries.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransportError {
    /// The HTTP status carried by this error, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when the server answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Why a source contributed no rows. Never fatal; the pipeline moves on to
/// the next source.
#[derive(Debug, Error)]
pub enum ExtractionGap {
    #[error("source page could not be fetched: {0}")]
    Fetch(#[from] TransportError),

    #[error("no results table found")]
    TableMissing,

    #[error("results table contained no usable rows")]
    NoRows,
}
