// Error types for tree generation and the render host.
//
// Configuration problems are reported before any geometry is built.
// Broken skeleton/ring invariants are bugs and panic instead of landing here.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the tree visualizer.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A config file could not be read or parsed.
    #[error("Could not load config from {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Adapter, device or surface setup failed.
    #[error("GPU error: {0}")]
    Gpu(String),
}

/// Convenience alias for `Result<T, TreeError>`.
pub type TreeResult<T> = Result<T, TreeError>;
