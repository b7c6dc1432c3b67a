use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::r#trait::{KeyValueStore, StoreError};

const EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

/// Directory-backed key-value store: one `<prefix><key>.json` file per key.
///
/// ## Atomic writes
///
/// `set` writes the full value to a sibling temp file, syncs it, then renames
/// it over the target. Readers see either the old or the new document, never
/// a partial one. Writers are serialized through an internal mutex so two
/// writes to the same key cannot interleave on the temp file.
///
/// ## Key space
///
/// Only files carrying the configured prefix belong to this store; anything
/// else in the directory is ignored by `keys`.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    prefix: String,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (creating if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}{key}.{EXTENSION}", self.prefix))
    }

    fn check_key(key: &str) -> Result<(), StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(StoreError::Rejected(format!("invalid key '{key}'")))
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::check_key(key)?;
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::LockPoisoned("json file store".to_string()))?;

        let target = self.path_for(key);
        let mut temp_name = target.clone().into_os_string();
        temp_name.push(TEMP_SUFFIX);
        let temp = PathBuf::from(temp_name);

        let mut file = fs::File::create(&temp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::check_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let suffix = format!(".{EXTENSION}");
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(key) = name
                .strip_prefix(self.prefix.as_str())
                .and_then(|rest| rest.strip_suffix(suffix.as_str()))
            {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
