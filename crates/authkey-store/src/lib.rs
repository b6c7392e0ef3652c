//! Filesystem-backed auth key store.
//! Loads the key file if present, otherwise generates a token from the OS
//! random source and persists it with owner-only permissions.

pub mod key_file;
pub mod random;
