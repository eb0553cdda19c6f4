//! Domain layer containing the dream pipeline's rules and types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, unit interval, errors, state machine)
//! - `normalize` - Tolerant extraction of JSON from model output
//! - `dream` - Description, title, scene plan, analysis and the generated dream
//! - `clarify` - Clarifying questions and the answer dialogue
//! - `session` - Session stage machine and accumulated state

pub mod clarify;
pub mod dream;
pub mod foundation;
pub mod normalize;
pub mod session;
