//! Unified error type for autostudio.
//!
//! Adapters, the store and the orchestrator all funnel their failures into
//! [`Error`]. Precondition failures ([`Error::is_precondition`]) are raised
//! before any state is touched; everything else may have been recorded in
//! the project log first.

use crate::project::AgentTag;
use crate::stage::Stage;

/// Unified error type covering all failure modes in autostudio.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller-supplied data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation was requested in a stage that does not allow it.
    #[error("Cannot {operation} while project is {actual} (expected {expected})")]
    InvalidStage {
        /// The rejected operation (e.g. "confirm script").
        operation: String,
        /// The stage the operation requires.
        expected: Stage,
        /// The stage the project was actually in.
        actual: Stage,
    },

    /// A frame index does not address an existing frame.
    #[error("Frame index {index} out of range (project has {len} frames)")]
    FrameIndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of frames at the time of the request.
        len: usize,
    },

    /// Another stage operation is already in flight for this project.
    #[error("A pipeline stage is already running")]
    Busy,

    /// A generation agent returned nothing usable.
    #[error("Generation error [{agent}]: {message}")]
    Generation {
        /// The agent whose output was rejected.
        agent: AgentTag,
        /// Human-readable error description.
        message: String,
    },

    /// Transport-level failure talking to an external provider.
    #[error("Provider error [{provider}]: {message}")]
    Provider {
        /// Name of the provider (e.g. "gemini").
        provider: String,
        /// Human-readable error description.
        message: String,
    },

    /// Storyboard ranges do not partition the script.
    #[error("Partition error: {0}")]
    Partition(String),

    /// Configuration could not be parsed or is unusable.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// `true` when the request was rejected before anything happened.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidStage { .. }
                | Error::FrameIndexOutOfRange { .. }
                | Error::Busy
        )
    }

    /// Convenience constructor for [`Error::InvalidStage`].
    pub fn invalid_stage(operation: impl Into<String>, expected: Stage, actual: Stage) -> Self {
        Error::InvalidStage {
            operation: operation.into(),
            expected,
            actual,
        }
    }

    /// Convenience constructor for [`Error::Generation`].
    pub fn generation(agent: AgentTag, message: impl Into<String>) -> Self {
        Error::Generation {
            agent,
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Provider`].
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
