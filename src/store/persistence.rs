//! Load/save backends for the rule and group stores.
//!
//! `YamlFile` is what the application uses; `MemoryPersistence` backs tests
//! and can be told to fail saves to exercise rollback.

use std::collections::HashSet;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use linkroute_config::{backup_path_for, write_atomic};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::Entity;
use crate::error::StoreError;

/// The load/save contract a store persists through
pub trait Persistence<T>: Send + Sync {
    /// Read the full collection. A missing source is an empty collection;
    /// unreadable or untrustworthy content is an error, never an empty list.
    fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Replace the persisted collection. Must be all-or-nothing.
    fn save(&self, items: &[T]) -> Result<(), StoreError>;

    /// Read the last-known-good copy kept by `save`
    fn load_backup(&self) -> Result<Vec<T>, StoreError>;
}

/// A YAML list of entities in one file, with a `.bak` sibling.
pub struct YamlFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> YamlFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.path)
    }
}

impl<T: Entity + Serialize + DeserializeOwned> YamlFile<T> {
    fn read_items(path: &Path) -> Result<Vec<T>, StoreError> {
        let contents = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        crate::debug_info!("STORE", "Read {} bytes from {:?}", contents.len(), path);

        if contents.trim().is_empty() {
            return Err(StoreError::Corrupt {
                path: path.to_path_buf(),
                details: "file is empty".to_string(),
            });
        }

        let items: Vec<T> =
            serde_yaml_ng::from_str(&contents).map_err(|e| StoreError::Corrupt {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?;

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id()) {
                return Err(StoreError::Corrupt {
                    path: path.to_path_buf(),
                    details: format!("duplicate {} id {}", T::KIND, item.id()),
                });
            }
        }
        Ok(items)
    }
}

impl<T: Entity + Serialize + DeserializeOwned> Persistence<T> for YamlFile<T> {
    fn load(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            crate::debug_info!("STORE", "No file at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }
        let items = Self::read_items(&self.path)?;
        log::info!("Loaded {} {}s from {:?}", items.len(), T::KIND, self.path);
        Ok(items)
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let yaml = serde_yaml_ng::to_string(items).map_err(|e| StoreError::Serialize {
            what: T::COLLECTION,
            details: e.to_string(),
        })?;

        // Only a file that still parses is worth keeping as the backup.
        if self.path.exists() && Self::read_items(&self.path).is_ok() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup)
                .map_err(|source| StoreError::Write { path: backup, source })?;
        }

        write_atomic(&self.path, yaml.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Saved {} {}s to {:?}", items.len(), T::KIND, self.path);
        Ok(())
    }

    fn load_backup(&self) -> Result<Vec<T>, StoreError> {
        let backup = self.backup_path();
        if !backup.exists() {
            return Err(StoreError::NoBackup { path: backup });
        }
        let items = Self::read_items(&backup)?;
        log::warn!(
            "Loaded {} {}s from backup {:?}",
            items.len(),
            T::KIND,
            backup
        );
        Ok(items)
    }
}

/// In-memory persistence for tests.
pub struct MemoryPersistence<T> {
    items: Mutex<Vec<T>>,
    backup: Mutex<Option<Vec<T>>>,
    fail_saves: AtomicBool,
    save_count: Mutex<usize>,
}

impl<T: Clone> MemoryPersistence<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Start with items already "on disk"
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            backup: Mutex::new(None),
            fail_saves: AtomicBool::new(false),
            save_count: Mutex::new(0),
        }
    }

    /// Make every subsequent save fail (or succeed again)
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Items as last persisted
    pub fn persisted(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        *self.save_count.lock()
    }
}

impl<T: Clone> Default for MemoryPersistence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> Persistence<T> for MemoryPersistence<T> {
    fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.items.lock().clone())
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Simulated);
        }
        let mut current = self.items.lock();
        *self.backup.lock() = Some(std::mem::replace(&mut *current, items.to_vec()));
        *self.save_count.lock() += 1;
        Ok(())
    }

    fn load_backup(&self) -> Result<Vec<T>, StoreError> {
        self.backup.lock().clone().ok_or(StoreError::NoBackup {
            path: PathBuf::from("<memory>"),
        })
    }
}

impl<T, P: Persistence<T> + ?Sized> Persistence<T> for std::sync::Arc<P> {
    fn load(&self) -> Result<Vec<T>, StoreError> {
        (**self).load()
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        (**self).save(items)
    }

    fn load_backup(&self) -> Result<Vec<T>, StoreError> {
        (**self).load_backup()
    }
}
