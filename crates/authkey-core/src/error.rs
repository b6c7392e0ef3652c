use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Filesystem step that failed while persisting or loading the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOp {
    Read,
    Write,
    Delete,
}

impl fmt::Display for PersistOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            PersistOp::Read => "read",
            PersistOp::Write => "write",
            PersistOp::Delete => "delete",
        };
        f.write_str(op)
    }
}

/// Errors produced while establishing the auth key.
#[derive(Debug, Error)]
pub enum AuthKeyError {
    /// No location could be resolved for the key file.
    #[error("cannot resolve auth key path: {reason}")]
    Path { reason: String },
    /// Reading, writing or removing the key file failed.
    #[error("failed to {op} auth key at {}: {source}", .path.display())]
    Persistence {
        op: PersistOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The random source failed or handed back something unusable.
    #[error("failed to generate auth key: {0}")]
    Generation(#[source] anyhow::Error),
    /// Self-healing gave up: the key file never settled on a usable value.
    #[error("auth key at {} still unusable after {attempts} attempts", .path.display())]
    Corruption { path: PathBuf, attempts: u32 },
}

impl AuthKeyError {
    pub fn persistence(op: PersistOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        AuthKeyError::Persistence {
            op,
            path: path.into(),
            source,
        }
    }
}
