//! Common types and utilities shared across Storyline crates.
//!
//! This crate holds the observability helpers and the shared error type used
//! throughout the Storyline workspace. It is intentionally lightweight so
//! that every crate can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`StorylineError`] and [`Result`]: Shared error handling for
//!   configuration, cache and encoding faults
//!
//! # Examples
//!
//! ```rust
//! use storyline_common::StorylineError;
//!
//! let err = StorylineError::Config("extract.limit must be at least 1".into());
//! assert_eq!(
//!     err.to_string(),
//!     "Configuration error: extract.limit must be at least 1"
//! );
//! ```
use std::path::PathBuf;

pub mod observability;

/// Error types used across the Storyline system.
#[derive(thiserror::Error, Debug)]
pub enum StorylineError {
    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The on-disk page or story cache could not be read or written.
    #[error("Cache error at {}: {source}", .path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stories could not be serialized.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StorylineError {
    /// Wrap an I/O failure with the cache path it happened on.
    pub fn cache(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Cache {
            path: path.into(),
            source,
        }
    }
}

/// Convenient alias for results that use [`StorylineError`].
pub type Result<T> = std::result::Result<T, StorylineError>;
