use std::{
    fs::{self, File, Metadata},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use authkey_core::{AuthKey, AuthKeyError, PathResolver, PersistOp, TokenSource, TOKEN_LEN};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroize;

/// Times an unusable key file is discarded and regenerated before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

/// Read-or-create store for the auth key, backed by a single owner-only file.
///
/// An existing non-empty file is loaded as-is. A missing file gets a freshly
/// generated token. An empty (or non-UTF-8) file is removed and the whole
/// procedure starts over; `max_attempts` bounds how many times that happens.
pub struct KeyFileStore<R: PathResolver, S: TokenSource> {
    resolver: R,
    source: S,
    max_attempts: u32,
}

enum Stored {
    Missing,
    Valid(AuthKey),
    Corrupted(Damage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Damage {
    Empty,
    NotUtf8,
}

impl<R: PathResolver, S: TokenSource> KeyFileStore<R, S> {
    pub fn new(resolver: R, source: S) -> Self {
        Self {
            resolver,
            source,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the self-healing bound (at least one regeneration is always allowed).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Where the key lives, as currently reported by the resolver.
    pub fn path(&self) -> Result<PathBuf, AuthKeyError> {
        self.resolver.auth_key_path()
    }

    /// Load the auth key, creating or repairing the key file as needed.
    ///
    /// Only discarded files count against `max_attempts`; losing a creation
    /// race to another writer is bounded separately by the same number.
    #[instrument(skip_all)]
    pub fn initialize(&self) -> Result<AuthKey, AuthKeyError> {
        let mut discarded = 0;
        let mut lost_races = 0;

        loop {
            let path = self.resolver.auth_key_path()?;

            match read_key(&path)? {
                Stored::Valid(key) => {
                    debug!(path = %path.display(), "loaded existing auth key");
                    return Ok(key);
                }
                Stored::Missing => {
                    let token = self
                        .source
                        .generate(TOKEN_LEN)
                        .map_err(AuthKeyError::Generation)?;
                    let key = AuthKey::from_generated(token)?;

                    if create_key_file(&path, &key)? {
                        info!(path = %path.display(), "generated new auth key");
                        return Ok(key);
                    }

                    lost_races += 1;
                    if lost_races > self.max_attempts {
                        return Err(AuthKeyError::Corruption {
                            path,
                            attempts: lost_races,
                        });
                    }
                    debug!(
                        path = %path.display(),
                        lost_races,
                        "key file appeared concurrently, reloading"
                    );
                }
                Stored::Corrupted(damage) => {
                    if discarded == self.max_attempts {
                        return Err(AuthKeyError::Corruption {
                            path,
                            attempts: discarded,
                        });
                    }
                    match damage {
                        Damage::Empty => warn!(
                            path = %path.display(),
                            "auth key file is empty, regenerating"
                        ),
                        Damage::NotUtf8 => warn!(
                            path = %path.display(),
                            "auth key file is not valid UTF-8, replacing it with a new key"
                        ),
                    }
                    remove_key_file(&path)?;
                    discarded += 1;
                }
            }
        }
    }
}

fn read_key(path: &Path) -> Result<Stored, AuthKeyError> {
    let read_err = |err: io::Error| AuthKeyError::persistence(PersistOp::Read, path, err);

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if is_missing(&err) => return Ok(Stored::Missing),
        Err(err) => return Err(read_err(err)),
    };
    let meta = file.metadata().map_err(read_err)?;
    audit_permissions(path, &meta);

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    let stored = match std::str::from_utf8(&bytes) {
        Ok(text) => AuthKey::from_stored(text)
            .map_or(Stored::Corrupted(Damage::Empty), Stored::Valid),
        Err(_) => Stored::Corrupted(Damage::NotUtf8),
    };
    bytes.zeroize();
    Ok(stored)
}

/// A path under a non-directory cannot exist either; treat it as absent and
/// let the write report the real problem.
fn is_missing(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// Write `key` to `path` unless the file already exists.
/// Returns `false` when another writer got there first.
fn create_key_file(path: &Path, key: &AuthKey) -> Result<bool, AuthKeyError> {
    let write_err = |err: io::Error| AuthKeyError::persistence(PersistOp::Write, path, err);

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
    restrict_permissions(tmp.as_file()).map_err(write_err)?;
    tmp.write_all(key.expose().as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(true),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(write_err(err.error)),
    }
}

fn remove_key_file(path: &Path) -> Result<(), AuthKeyError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(AuthKeyError::persistence(PersistOp::Delete, path, err)),
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(KEY_FILE_MODE))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn audit_permissions(path: &Path, meta: &Metadata) {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode() & 0o777;
    if mode & 0o077 != 0 {
        warn!(
            path = %path.display(),
            mode = %format_args!("{mode:o}"),
            "auth key file is accessible to other users"
        );
    }
}

#[cfg(not(unix))]
fn audit_permissions(_path: &Path, _meta: &Metadata) {}
