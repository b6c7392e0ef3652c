use std::fmt;

use anyhow::anyhow;
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::error::AuthKeyError;

/// Length of freshly generated tokens.
pub const TOKEN_LEN: usize = 64;

/// Shared secret local clients present to prove they may command the service.
///
/// Always non-empty. The token is wiped from memory on drop and never shows up
/// in `Debug` output; use [`AuthKey::expose`] where the raw value is needed.
#[derive(Clone)]
pub struct AuthKey {
    token: String,
}

impl AuthKey {
    /// Build a key from stored file contents, dropping surrounding whitespace.
    /// Returns `None` when nothing is left, which marks the file as corrupted.
    pub fn from_stored(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            token: trimmed.to_owned(),
        })
    }

    /// Accept a token produced by a [`crate::TokenSource`].
    ///
    /// The token is written to disk verbatim and must read back unchanged, so
    /// empty tokens and tokens containing whitespace are rejected.
    pub fn from_generated(mut token: String) -> Result<Self, AuthKeyError> {
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            token.zeroize();
            return Err(AuthKeyError::Generation(anyhow!(
                "token source produced an empty or whitespace-bearing token"
            )));
        }
        Ok(Self { token })
    }

    /// The raw token.
    pub fn expose(&self) -> &str {
        &self.token
    }

    /// Constant-time check of a token presented by a client.
    pub fn verify(&self, candidate: &str) -> bool {
        self.token.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl PartialEq for AuthKey {
    fn eq(&self, other: &Self) -> bool {
        self.verify(&other.token)
    }
}

impl Eq for AuthKey {}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKey")
            .field("len", &self.token.len())
            .finish_non_exhaustive()
    }
}

impl Drop for AuthKey {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}
