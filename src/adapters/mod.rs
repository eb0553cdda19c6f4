//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Gemini REST client and the scripted mock provider
//! - `export` - Local file output for the panorama viewer

pub mod ai;
pub mod export;
