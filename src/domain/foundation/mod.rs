//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the Dreamscape domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;
mod unit_interval;

pub use errors::ValidationError;
pub use ids::SessionId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
pub use unit_interval::UnitInterval;
