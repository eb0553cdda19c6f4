//! State machine trait for stage enums.
//!
//! Provides a consistent interface for validating and performing transitions
//! on small closed lifecycles (the dream session stage, the clarification
//! phase).

use super::ValidationError;

/// Trait for enums that represent state machines.
///
/// Implementors define valid transitions and get validated transition
/// methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for Stage {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!(
///             (self, target),
///             (Input, Clarify) | (Clarify, Analyzing) | (_, Input)
///         )
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> { /* ... */ }
/// }
///
/// let next = stage.transition_to(Stage::Clarify)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_transition(
                format!("{:?}", self),
                format!("{:?}", target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Closed,
        Open,
        Locked,
        Removed,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Door::*;
            match self {
                Closed => vec![Open, Locked, Removed],
                Open => vec![Closed],
                Locked => vec![Closed],
                Removed => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_valid_transition() {
        assert_eq!(Door::Closed.transition_to(Door::Open), Ok(Door::Open));
    }

    #[test]
    fn transition_to_reports_both_states_on_failure() {
        let err = Door::Open.transition_to(Door::Locked).unwrap_err();
        assert_eq!(err, ValidationError::invalid_transition("Open", "Locked"));
    }

    #[test]
    fn terminal_state_has_no_transitions() {
        assert!(Door::Removed.is_terminal());
        assert!(!Door::Locked.is_terminal());
    }
}
