//! JSON file credential store.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use jules_core::{CredentialError, CredentialStore};

/// Credential store persisted as a flat JSON object.
///
/// The file is read once at [`open`](Self::open) and rewritten on every
/// `set`, with owner-only permissions on unix.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileCredentialStore {
    /// `<config dir>/jules/credentials.json`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jules").join("credentials.json"))
    }

    /// Open the store at [`default_path`](Self::default_path).
    ///
    /// # Errors
    /// Returns error if no config directory is known or the file is invalid.
    pub fn open_default() -> Result<Self, CredentialError> {
        let path = Self::default_path()
            .ok_or_else(|| CredentialError::Internal("no config directory".to_string()))?;
        Self::open(path)
    }

    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CredentialError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), entries = values.len(), "credential store opened");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);

        // New files are created owner-only; an existing file is tightened
        // before it is truncated and rewritten.
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            if self.path.exists() {
                std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
            }
        }

        let mut file = options.open(&self.path)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| CredentialError::Internal(e.to_string()))?;
        let mut updated = values.clone();
        updated.insert(key.to_string(), value.to_string());
        self.save(&updated)?;
        *values = updated;
        Ok(())
    }
}
