use std::path::PathBuf;

use crate::error::AuthKeyError;

/// Supplies the location of the key file.
///
/// Consulted again on every self-healing attempt, so implementations should be
/// cheap and side-effect free.
pub trait PathResolver: Send + Sync {
    fn auth_key_path(&self) -> Result<PathBuf, AuthKeyError>;
}

/// Resolver for a path known up front (tests, explicit overrides).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPath(PathBuf);

impl FixedPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }
}

impl PathResolver for FixedPath {
    fn auth_key_path(&self) -> Result<PathBuf, AuthKeyError> {
        Ok(self.0.clone())
    }
}

impl<R: PathResolver + ?Sized> PathResolver for &R {
    fn auth_key_path(&self) -> Result<PathBuf, AuthKeyError> {
        (**self).auth_key_path()
    }
}
