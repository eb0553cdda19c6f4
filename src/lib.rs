//! Dreamscape - Dream visualizer and analyst
//!
//! A dream description goes through an optional clarifying interview and a
//! structured analysis, then becomes a titled 360-degree panorama with a
//! small scene of primitive objects, all produced by a generative model
//! service.

pub mod adapters;
pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod ports;
