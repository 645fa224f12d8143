//! Credential storage.
//!
//! The credential pair lives under two fixed keys, `token` (access) and
//! `refreshToken` (refresh). Only the API client's refresh path and the
//! session mirror's login/logout paths write to the store.
//!
//! Two implementations are provided:
//! - [`MemoryTokenStore`] - process-local, for tests and embedders that
//!   persist credentials themselves
//! - [`FileTokenStore`] - a JSON file written with `0600` permissions

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors raised by a [`TokenStore`].
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Failed to access credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse credential file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The two credentials a session holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKey {
    /// Short-lived token sent with every request.
    Access,
    /// Longer-lived token used only to obtain a new access token.
    Refresh,
}

impl TokenKey {
    /// Fixed storage key for this credential.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            Self::Access => "token",
            Self::Refresh => "refreshToken",
        }
    }
}

/// Persistent storage for the credential pair.
///
/// Implementations must make [`TokenStore::clear`] remove both tokens in a
/// single step so a failure can never leave exactly one of them behind.
pub trait TokenStore: Send + Sync {
    /// Read a token.
    fn get(&self, key: TokenKey) -> Option<SecretString>;

    /// Write a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: TokenKey, value: SecretString) -> Result<(), TokenStoreError>;

    /// Remove a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: TokenKey) -> Result<(), TokenStoreError>;

    /// Remove both tokens at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), TokenStoreError>;

    /// Whether an access token is present.
    fn has_access_token(&self) -> bool {
        self.get(TokenKey::Access).is_some()
    }
}

type Entries = BTreeMap<String, String>;

fn read_entry(entries: &Entries, key: TokenKey) -> Option<SecretString> {
    entries
        .get(key.storage_key())
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.clone()))
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<Entries>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds the given credentials.
    #[must_use]
    pub fn with_tokens(access: Option<&str>, refresh: Option<&str>) -> Self {
        let mut entries = Entries::new();
        if let Some(access) = access {
            entries.insert(TokenKey::Access.storage_key().to_string(), access.to_string());
        }
        if let Some(refresh) = refresh {
            entries.insert(TokenKey::Refresh.storage_key().to_string(), refresh.to_string());
        }
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: TokenKey) -> Option<SecretString> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        read_entry(&entries, key)
    }

    fn set(&self, key: TokenKey, value: SecretString) -> Result<(), TokenStoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.storage_key().to_string(), value.expose_secret().to_string());
        Ok(())
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key.storage_key());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

// =============================================================================
// FileTokenStore
// =============================================================================

/// Token store backed by a JSON file (`{"token": ..., "refreshToken": ...}`).
///
/// The file is read once on open and rewritten on every mutation with
/// restricted permissions (0600). Token values are never logged.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl FileTokenStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| TokenStoreError::Io {
                path: path.clone(),
                source,
            })?;
            if contents.trim().is_empty() {
                Entries::new()
            } else {
                serde_json::from_str(&contents).map_err(|source| TokenStoreError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            Entries::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` and persist the result while holding the write lock.
    fn update(&self, change: impl FnOnce(&mut Entries)) -> Result<(), TokenStoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        change(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn persist(&self, entries: &Entries) -> Result<(), TokenStoreError> {
        let io_err = |source| TokenStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let contents = serde_json::to_string_pretty(entries).map_err(|source| {
            TokenStoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(io_err)?;
        file.write_all(contents.as_bytes()).map_err(io_err)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: TokenKey) -> Option<SecretString> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        read_entry(&entries, key)
    }

    fn set(&self, key: TokenKey, value: SecretString) -> Result<(), TokenStoreError> {
        self.update(|entries| {
            entries.insert(key.storage_key().to_string(), value.expose_secret().to_string());
        })
    }

    fn remove(&self, key: TokenKey) -> Result<(), TokenStoreError> {
        self.update(|entries| {
            entries.remove(key.storage_key());
        })
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        self.update(|entries| {
            entries.remove(TokenKey::Access.storage_key());
            entries.remove(TokenKey::Refresh.storage_key());
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(TokenKey::Access.storage_key(), "token");
        assert_eq!(TokenKey::Refresh.storage_key(), "refreshToken");
    }

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = MemoryTokenStore::new();
        assert!(!store.has_access_token());

        store.set(TokenKey::Access, secret("a-1")).unwrap();
        store.set(TokenKey::Refresh, secret("r-1")).unwrap();
        assert_eq!(store.get(TokenKey::Access).unwrap().expose_secret(), "a-1");

        store.remove(TokenKey::Access).unwrap();
        assert!(store.get(TokenKey::Access).is_none());
        assert!(store.get(TokenKey::Refresh).is_some());

        store.clear().unwrap();
        assert!(store.get(TokenKey::Refresh).is_none());
    }

    #[test]
    fn test_empty_value_reads_as_absent() {
        let store = MemoryTokenStore::with_tokens(Some(""), Some("r"));
        assert!(!store.has_access_token());
        assert!(store.get(TokenKey::Refresh).is_some());
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileTokenStore::open(&path).unwrap();
        assert!(!store.has_access_token());
        store.set(TokenKey::Access, secret("a-1")).unwrap();
        store.set(TokenKey::Refresh, secret("r-1")).unwrap();

        let reopened = FileTokenStore::open(&path).unwrap();
        assert_eq!(reopened.get(TokenKey::Access).unwrap().expose_secret(), "a-1");
        assert_eq!(reopened.get(TokenKey::Refresh).unwrap().expose_secret(), "r-1");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "a-1");
        assert_eq!(raw["refreshToken"], "r-1");
    }

    #[test]
    fn test_file_store_clear_removes_both() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileTokenStore::open(&path).unwrap();
        store.set(TokenKey::Access, secret("a")).unwrap();
        store.set(TokenKey::Refresh, secret("r")).unwrap();

        store.clear().unwrap();

        let reopened = FileTokenStore::open(&path).unwrap();
        assert!(reopened.get(TokenKey::Access).is_none());
        assert!(reopened.get(TokenKey::Refresh).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = FileTokenStore::open(&path).unwrap();
        store.set(TokenKey::Access, secret("a")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            FileTokenStore::open(&path),
            Err(TokenStoreError::Parse { .. })
        ));
    }
}
