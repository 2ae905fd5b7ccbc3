//! Stage errors for the frame loop.

use thiserror::Error;

/// Errors raised by individual pipeline stages.
///
/// Every variant is recoverable and handled where it occurs: a detection
/// failure skips the frame, an extraction failure degrades the alert to
/// the placeholder location, a dispatch failure drops that one delivery.
/// None of them end the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("detection failed: {0}")]
    Detection(#[source] anyhow::Error),

    #[error("location extraction failed: {0}")]
    Extraction(#[source] anyhow::Error),

    #[error("alert dispatch failed: {0}")]
    Dispatch(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn display_names_the_stage() {
        let err = PipelineError::Dispatch(anyhow!("connection refused"));
        assert_eq!(err.to_string(), "alert dispatch failed: connection refused");

        let err = PipelineError::Detection(anyhow!("backend crashed"));
        assert!(err.to_string().starts_with("detection failed"));
    }

    #[test]
    fn source_is_preserved() {
        let err = PipelineError::Extraction(anyhow!("no caption band"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
