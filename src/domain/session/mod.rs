//! Dream session: stage machine and the state produced along the way.

mod aggregate;
mod errors;
mod stage;

pub use aggregate::DreamSession;
pub use errors::{DreamError, SessionError};
pub use stage::Stage;
