//! studio-core: project model, stages, IDs, errors, configuration, and the
//! state-change event bus.
//!
//! This crate is the foundational dependency for the other studio-* crates.

pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod project;
pub mod stage;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
pub use project::*;
pub use stage::Stage;
