//! AutoStudio - generative media pipeline runner
//!
//! This library crate exposes the CLI building blocks for integration testing.

pub mod config;
pub mod director;
pub mod timeline;
