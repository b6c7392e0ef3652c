//! Core abstractions for authkey: the in-memory auth key and the contracts
//! the key store is wired through (path resolution, random generation).
//! This crate does no I/O of its own.

pub mod error;
pub mod key;
pub mod resolver;
pub mod source;

pub use error::{AuthKeyError, PersistOp};
pub use key::{AuthKey, TOKEN_LEN};
pub use resolver::{FixedPath, PathResolver};
pub use source::TokenSource;
