//! studio-pipeline: the project store and the orchestrator that moves a
//! project through script, storyboard and production.

pub mod orchestrator;
pub mod production;
pub mod store;

#[cfg(test)]
mod testing;

pub use orchestrator::Orchestrator;
pub use production::{ProductionReport, SceneFailure};
pub use store::ProjectStore;
