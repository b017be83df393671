use thiserror::Error;
use tvrank_scraper::TransportError;

/// Failure to create or update a remote artifact.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("transport failure during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("remote store rejected {operation} with HTTP {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to build workbook: {0}")]
    Serialize(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid publish target \"{artifact}\": {reason}")]
    InvalidTarget { artifact: String, reason: String },
}

impl PublishError {
    /// Maps a transport failure: a server answer becomes
    /// [`PublishError::Rejected`], anything else stays a transport error.
    pub(crate) fn from_transport(operation: &'static str, err: TransportError) -> Self {
        match err {
            TransportError::Status { status, body, .. } => PublishError::Rejected {
                operation,
                status,
                body,
            },
            source => PublishError::Transport { operation, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_become_rejections() {
        let err = PublishError::from_transport(
            "update",
            TransportError::Status {
                status: 409,
                url: "https://api.github.com/x".to_string(),
                body: "sha mismatch".to_string(),
            },
        );
        assert!(matches!(
            err,
            PublishError::Rejected { operation: "update", status: 409, ref body } if body == "sha mismatch"
        ));
    }

    #[test]
    fn other_errors_stay_transport_errors() {
        let err = PublishError::from_transport(
            "create",
            TransportError::InvalidUrl {
                url: "::".to_string(),
                reason: "bad".to_string(),
            },
        );
        assert!(matches!(err, PublishError::Transport { operation: "create", .. }));
    }
}
