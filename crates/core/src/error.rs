use std::time::Duration;

/// Request-level failures of the recommendation pipeline.
///
/// Per-candidate valuation failures never show up here unless every candidate failed.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),
    #[error("data unavailable: {0:#}")]
    DataUnavailable(anyhow::Error),
    #[error("no candidates could be valued ({failed} valuation failures)")]
    NoCandidatesScored { failed: usize },
    #[error("recommendation timed out after {0:?}")]
    Timeout(Duration),
}

impl RecommendError {
    pub fn invalid(err: anyhow::Error) -> Self {
        Self::InvalidCriteria(format!("{err:#}"))
    }

    /// Stable machine-readable tag.
    pub const fn kind(&self) -> &'static str {
        match self {
            RecommendError::InvalidCriteria(_) => "invalid_criteria",
            RecommendError::DataUnavailable(_) => "data_unavailable",
            RecommendError::NoCandidatesScored { .. } => "no_candidates_scored",
            RecommendError::Timeout(_) => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn messages_are_human_readable() {
        let err = RecommendError::invalid(anyhow!("budget range is inverted"));
        assert_eq!(err.to_string(), "invalid criteria: budget range is inverted");
        assert_eq!(err.kind(), "invalid_criteria");

        let err = RecommendError::DataUnavailable(
            anyhow!("connection refused").context("inventory fetch failed"),
        );
        assert_eq!(
            err.to_string(),
            "data unavailable: inventory fetch failed: connection refused"
        );

        let err = RecommendError::NoCandidatesScored { failed: 3 };
        assert!(err.to_string().contains("3 valuation failures"));
    }
}
