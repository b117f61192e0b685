/// Clients for the external HTTP services the scan pipeline delegates to
///
/// - `ocr`: OCR.space text extraction
/// - `cohere`: Cohere text generation for the medicine analysis
///
/// Both wrap exactly one API call each, with no retries; a failure is
/// reported immediately, tagged with the pipeline stage it came from.

pub mod cohere;
pub mod ocr;

/// Error type for external service calls
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure: timeout, connect, TLS, malformed body
    #[error("{stage} transport error: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered, but with an error status or error payload
    #[error("{stage} service error: {message}")]
    Service {
        stage: &'static str,
        message: String,
    },

    /// Reading the stored upload from disk failed
    #[error("{stage} file error: {source}")]
    Io {
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    /// Which pipeline stage produced this error
    pub fn stage(&self) -> &'static str {
        match self {
            ClientError::Transport { stage, .. }
            | ClientError::Service { stage, .. }
            | ClientError::Io { stage, .. } => stage,
        }
    }
}
