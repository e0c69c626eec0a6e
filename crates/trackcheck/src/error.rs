use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal failures that stop a validation run before a report can be produced.
///
/// Per-link and per-entry problems never surface here; they are collected as
/// [`crate::report::ValidationError`] values instead.
#[derive(Debug, Error)]
pub enum TrackcheckError {
    #[error("unable to resolve {}: {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown type '{name}' (expected one of: {})", known.join(", "))]
    UnknownType { name: String, known: Vec<String> },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for TrackcheckError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl TrackcheckError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            TrackcheckError::Config(msg) => TrackcheckError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}
