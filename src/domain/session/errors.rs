//! Session-specific error types.

use thiserror::Error;

use crate::domain::clarify::ClarifyError;
use crate::domain::foundation::ValidationError;

/// Messages shown to the user. These never force a stage change on their
/// own; the session decides whether to advance, stay or halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DreamError {
    #[error("Please describe your dream first.")]
    EmptyDescription,

    #[error("Analysis failed. Proceeding to visualization.")]
    AnalysisFailed,

    #[error("The dream description could not be processed due to safety policies. Please try a different description.")]
    SafetyBlocked,

    #[error("Failed to bring your dream to life. The connection to the dream realm might be unstable.")]
    VisualizationFailed,
}

impl DreamError {
    /// Whether the session can still reach `done` without a restart.
    pub fn is_advisory(&self) -> bool {
        matches!(self, DreamError::AnalysisFailed)
    }
}

/// Errors raised when an operation does not fit the session's state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{0}")]
    Rejected(DreamError),

    #[error(transparent)]
    InvalidStage(#[from] ValidationError),

    #[error(transparent)]
    Clarify(#[from] ClarifyError),

    #[error("Session halted after a failed visualization; start over to continue")]
    Halted,
}

impl From<DreamError> for SessionError {
    fn from(err: DreamError) -> Self {
        SessionError::Rejected(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages() {
        assert_eq!(
            DreamError::EmptyDescription.to_string(),
            "Please describe your dream first."
        );
        assert_eq!(
            DreamError::AnalysisFailed.to_string(),
            "Analysis failed. Proceeding to visualization."
        );
        assert!(DreamError::SafetyBlocked.to_string().contains("safety policies"));
        assert!(DreamError::VisualizationFailed
            .to_string()
            .starts_with("Failed to bring your dream to life."));
    }

    #[test]
    fn only_analysis_failure_is_advisory() {
        assert!(DreamError::AnalysisFailed.is_advisory());
        assert!(!DreamError::VisualizationFailed.is_advisory());
        assert!(!DreamError::SafetyBlocked.is_advisory());
    }

    #[test]
    fn rejection_displays_user_message() {
        let err: SessionError = DreamError::EmptyDescription.into();
        assert_eq!(err.to_string(), "Please describe your dream first.");
    }
}
