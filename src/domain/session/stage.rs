//! Stage of the dream session.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where the session is in the describe, clarify, analyze, visualize flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Input,
    Clarify,
    Analyzing,
    Visualizing,
    Done,
}

impl Stage {
    /// Stages during which a remote request is expected to be outstanding.
    pub fn awaits_remote(&self) -> bool {
        matches!(self, Stage::Clarify | Stage::Analyzing | Stage::Visualizing)
    }
}

impl StateMachine for Stage {
    fn can_transition_to(&self, target: &Self) -> bool {
        use Stage::*;
        matches!(
            (self, target),
            (_, Input)
                | (Input, Clarify)
                | (Clarify, Analyzing)
                | (Analyzing, Visualizing)
                | (Visualizing, Done)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use Stage::*;
        match self {
            Input => vec![Input, Clarify],
            Clarify => vec![Input, Analyzing],
            Analyzing => vec![Input, Visualizing],
            Visualizing => vec![Input, Done],
            Done => vec![Input],
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Input => "input",
            Stage::Clarify => "clarify",
            Stage::Analyzing => "analyzing",
            Stage::Visualizing => "visualizing",
            Stage::Done => "done",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_is_valid() {
        let stage = Stage::Input
            .transition_to(Stage::Clarify)
            .and_then(|s| s.transition_to(Stage::Analyzing))
            .and_then(|s| s.transition_to(Stage::Visualizing))
            .and_then(|s| s.transition_to(Stage::Done))
            .unwrap();
        assert_eq!(stage, Stage::Done);
    }

    #[test]
    fn every_stage_returns_to_input() {
        for stage in [
            Stage::Input,
            Stage::Clarify,
            Stage::Analyzing,
            Stage::Visualizing,
            Stage::Done,
        ] {
            assert!(stage.can_transition_to(&Stage::Input));
            assert!(!stage.is_terminal());
        }
    }

    #[test]
    fn skipping_stages_is_rejected() {
        assert!(Stage::Input.transition_to(Stage::Analyzing).is_err());
        assert!(Stage::Clarify.transition_to(Stage::Done).is_err());
        assert!(Stage::Done.transition_to(Stage::Visualizing).is_err());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Stage::Visualizing.to_string(), "visualizing");
        assert_eq!(serde_json::to_string(&Stage::Done).unwrap(), "\"done\"");
    }
}
