//! Generic file-backed registry
//!
//! Every record lives in its own directory as `<root>/<name>/.config.json`.
//! Reads always go to disk so edits made outside the process are visible
//! on the next call. Listeners registered with [`FileRegistry::subscribe`]
//! are notified after each successful write.

mod events;

pub use events::{RegistryEvent, SubscriptionId};

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use self::events::Listeners;
use crate::files::{self, CONFIG_FILE};
use crate::{Error, Result};

/// A record that can be stored in a [`FileRegistry`]
pub trait RegistryEntry: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Unique key of the record within its registry
    fn name(&self) -> &str;
}

/// Keyed collection of records persisted one file per record
pub struct FileRegistry<T> {
    registry_name: String,
    root: PathBuf,
    listeners: Listeners,
    _entry: std::marker::PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for FileRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRegistry")
            .field("registry_name", &self.registry_name)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl<T: RegistryEntry> FileRegistry<T> {
    /// Create a registry named `registry_name` rooted at `root`
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(registry_name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            registry_name: registry_name.into(),
            root: root.into(),
            listeners: Listeners::default(),
            _entry: std::marker::PhantomData,
        }
    }

    /// Registry name used in error messages
    #[must_use]
    pub fn registry_name(&self) -> &str {
        &self.registry_name
    }

    /// Root directory of the registry
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the record `name`
    #[must_use]
    pub fn entry_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn config_path(&self, name: &str) -> PathBuf {
        self.entry_dir(name).join(CONFIG_FILE)
    }

    /// Load a record by name
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no record is stored under `name`
    pub async fn get(&self, name: &str) -> Result<T> {
        validate_name(&self.registry_name, name)?;
        let path = self.config_path(name);
        if !tokio::fs::try_exists(&path).await? {
            return Err(Error::not_found(&self.registry_name, name, None));
        }
        files::read_json(&path).await
    }

    /// Load every record, ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the registry directory or a record cannot be read
    pub async fn get_all(&self) -> Result<Vec<T>> {
        let mut entries = Vec::new();
        for dir in files::list_subdirectories(&self.root).await? {
            let path = dir.join(CONFIG_FILE);
            if !tokio::fs::try_exists(&path).await? {
                tracing::debug!(path = %dir.display(), "no registry config in directory, skipping");
                continue;
            }
            entries.push(files::read_json::<T>(&path).await?);
        }
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(entries)
    }

    /// Whether a record named `name` is stored
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a name that is not a single path
    /// component, or an error if the file system cannot be queried
    pub async fn exists(&self, name: &str) -> Result<bool> {
        validate_name(&self.registry_name, name)?;
        Ok(tokio::fs::try_exists(self.config_path(name)).await?)
    }

    /// Store a new record
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyExists` if the name is taken, or an IO error if the write fails
    pub async fn add(&self, entry: &T) -> Result<()> {
        let name = self.check_name(entry)?;
        if self.exists(name).await? {
            return Err(Error::AlreadyExists {
                registry: self.registry_name.clone(),
                key: name.to_string(),
            });
        }
        files::write_json(&self.config_path(name), entry).await?;
        tracing::info!(registry = %self.registry_name, name, "added registry entry");
        self.listeners.notify(&RegistryEvent::Added(name.to_string()));
        Ok(())
    }

    /// Overwrite an existing record
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the record does not exist, or an IO error if the write fails
    pub async fn update(&self, entry: &T) -> Result<()> {
        let name = self.check_name(entry)?;
        if !self.exists(name).await? {
            return Err(Error::not_found(&self.registry_name, name, None));
        }
        files::write_json(&self.config_path(name), entry).await?;
        tracing::info!(registry = %self.registry_name, name, "updated registry entry");
        self.listeners
            .notify(&RegistryEvent::Updated(name.to_string()));
        Ok(())
    }

    /// Remove a record and everything stored alongside it
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the record does not exist and `ignore_missing` is false
    pub async fn delete(&self, name: &str, ignore_missing: bool) -> Result<()> {
        if !self.exists(name).await? {
            if ignore_missing {
                return Ok(());
            }
            return Err(Error::not_found(&self.registry_name, name, None));
        }
        tokio::fs::remove_dir_all(self.entry_dir(name)).await?;
        tracing::info!(registry = %self.registry_name, name, "deleted registry entry");
        self.listeners
            .notify(&RegistryEvent::Deleted(name.to_string()));
        Ok(())
    }

    /// Remove every record
    ///
    /// # Errors
    ///
    /// Returns an error if a record directory cannot be removed
    pub async fn clear(&self) -> Result<()> {
        for dir in files::list_subdirectories(&self.root).await? {
            if tokio::fs::try_exists(dir.join(CONFIG_FILE)).await? {
                tokio::fs::remove_dir_all(&dir).await?;
            }
        }
        tracing::info!(registry = %self.registry_name, "cleared registry");
        self.listeners.notify(&RegistryEvent::Cleared);
        Ok(())
    }

    /// Register a listener invoked after every successful write
    #[must_use]
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    /// Remove a listener, returning true if it was registered
    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    /// Forward an event to listeners for writes performed outside this registry's directory
    pub(crate) fn notify(&self, event: &RegistryEvent) {
        self.listeners.notify(event);
    }

    fn check_name<'a>(&self, entry: &'a T) -> Result<&'a str> {
        let name = entry.name();
        validate_name(&self.registry_name, name)?;
        Ok(name)
    }
}

/// Reject names that are not a single path component
pub(crate) fn validate_name(registry: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Validation(format!(
            "invalid {registry} entry name \"{name}\""
        )));
    }
    Ok(())
}

/// Sort entries by label, then move labels starting with `local_prefix` to the front
///
/// Labels compare case-insensitively, with the exact label breaking ties.
/// Relative order is preserved within both groups. With no prefix the
/// entries are only sorted.
#[must_use]
pub fn order_for_display<T>(
    mut entries: Vec<T>,
    label: impl Fn(&T) -> &str,
    local_prefix: Option<&str>,
) -> Vec<T> {
    entries.sort_by_cached_key(|entry| {
        let text = label(entry);
        (text.to_lowercase(), text.to_string())
    });
    let Some(prefix) = local_prefix else {
        return entries;
    };
    let (local, others): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|entry| label(entry).starts_with(prefix));
    local.into_iter().chain(others).collect()
}
