//! Error types.
//!
//! The per-frame path never fails: untracked hands, missing joints and ray
//! misses are ordinary states.  Errors only exist where a caller can act on
//! them, namely loading configuration and misusing a stroke id.

use std::path::PathBuf;

use thiserror::Error;

use crate::stroke::StrokeId;

/// Failure to load or validate a [`PaintConfig`](crate::PaintConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is outside its meaningful range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Misuse of the single active-stroke discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StrokeError {
    #[error("stroke {0} does not exist")]
    UnknownStroke(StrokeId),

    #[error("stroke {0} is not the active stroke")]
    NotActive(StrokeId),
}
