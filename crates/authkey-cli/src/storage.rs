use std::path::PathBuf;

use authkey_core::{AuthKeyError, PathResolver};
use authkey_store::{key_file::KeyFileStore, random::OsTokenSource};
use dirs::data_dir;
use tracing::debug;

use crate::config::Config;

pub const KEY_FILE_NAME: &str = "auth.key";

/// Resolve the default data directory for authkey.
pub fn default_data_dir() -> Result<PathBuf, AuthKeyError> {
    let base = data_dir().ok_or_else(|| AuthKeyError::Path {
        reason: "no data dir available".to_string(),
    })?;
    Ok(base.join("authkey"))
}

/// Key file location from config overrides, falling back to the platform data dir.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredPath {
    key_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl ConfiguredPath {
    pub fn from_config(config: &Config) -> Self {
        Self {
            key_path: config.key_path.clone(),
            data_dir: config.data_dir.clone(),
        }
    }
}

impl PathResolver for ConfiguredPath {
    fn auth_key_path(&self) -> Result<PathBuf, AuthKeyError> {
        if let Some(path) = &self.key_path {
            return Ok(path.clone());
        }
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        Ok(dir.join(KEY_FILE_NAME))
    }
}

/// Build the key store backed by OS randomness, honouring config overrides.
pub fn store_from_config(config: &Config) -> KeyFileStore<ConfiguredPath, OsTokenSource> {
    let resolver = ConfiguredPath::from_config(config);
    debug!(?resolver, "initializing auth key store");

    let store = KeyFileStore::new(resolver, OsTokenSource);
    match config.max_attempts {
        Some(attempts) => store.with_max_attempts(attempts),
        None => store,
    }
}

/// Helper for tests to build a store whose key lives in `dir`.
#[cfg(test)]
pub fn test_store(dir: impl Into<PathBuf>) -> KeyFileStore<ConfiguredPath, OsTokenSource> {
    store_from_config(&Config {
        data_dir: Some(dir.into()),
        ..Config::default()
    })
}
