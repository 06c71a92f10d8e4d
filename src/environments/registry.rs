//! Registry of environment descriptors

use std::path::{Path, PathBuf};

use super::types::{EnvironmentEntry, EnvironmentFlags};
use crate::registry::{FileRegistry, RegistryEvent, SubscriptionId};
use crate::{Error, Result};

/// Registry name used in error messages
pub const ENVIRONMENT_REGISTRY: &str = "environments";

/// Persisted environment descriptors with tag filtering
#[derive(Debug)]
pub struct EnvironmentRegistry {
    store: FileRegistry<EnvironmentEntry>,
}

impl EnvironmentRegistry {
    /// Registry stored under `<storage_dir>/environments`
    #[must_use]
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            store: FileRegistry::new(ENVIRONMENT_REGISTRY, storage_dir.join("environments")),
        }
    }

    /// Directory holding one subdirectory per environment
    #[must_use]
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Directory owned by `entry`
    #[must_use]
    pub fn environment_directory(&self, entry: &EnvironmentEntry) -> PathBuf {
        entry.directory(self.store.root())
    }

    /// Load an environment by name
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the environment is not registered
    pub async fn get(&self, name: &str) -> Result<EnvironmentEntry> {
        self.store.get(name).await
    }

    /// List environments filtered by tags, local environments first
    ///
    /// An entry is dropped if it carries any tag from `exclude`. If `include`
    /// is non-empty, only entries carrying at least one of its tags are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read
    pub async fn get_all(
        &self,
        include: &[EnvironmentFlags],
        exclude: &[EnvironmentFlags],
    ) -> Result<Vec<EnvironmentEntry>> {
        let entries = self.store.get_all().await?;
        Ok(filter_and_order(entries, include, exclude))
    }

    /// Whether an environment is registered
    ///
    /// # Errors
    ///
    /// Returns an error if the file system cannot be queried
    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(name).await
    }

    /// Register a new environment
    ///
    /// # Errors
    ///
    /// Returns a validation error for a Microfab entry without URL, or
    /// `Error::AlreadyExists` if the name is taken
    pub async fn add(&self, entry: &EnvironmentEntry) -> Result<()> {
        validate(entry)?;
        self.store.add(entry).await
    }

    /// Overwrite a registered environment
    ///
    /// # Errors
    ///
    /// Returns a validation error for a Microfab entry without URL, or
    /// `Error::NotFound` if the environment is not registered
    pub async fn update(&self, entry: &EnvironmentEntry) -> Result<()> {
        validate(entry)?;
        self.store.update(entry).await
    }

    /// Remove an environment and its registry directory
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if missing and `ignore_missing` is false
    pub async fn delete(&self, name: &str, ignore_missing: bool) -> Result<()> {
        self.store.delete(name, ignore_missing).await
    }

    /// Remove every environment
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be removed
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Register a change listener
    #[must_use]
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Remove a change listener
    #[must_use]
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}

fn validate(entry: &EnvironmentEntry) -> Result<()> {
    if entry.environment_type.contains(EnvironmentFlags::MICROFAB)
        && entry.url.as_deref().is_none_or(str::is_empty)
    {
        return Err(Error::Validation(format!(
            "microfab environment \"{}\" is missing required field \"url\"",
            entry.name
        )));
    }
    Ok(())
}

/// Apply include/exclude tag filters, then move local entries to the front
///
/// Relative order is preserved within the local and non-local groups.
#[must_use]
pub fn filter_and_order(
    entries: Vec<EnvironmentEntry>,
    include: &[EnvironmentFlags],
    exclude: &[EnvironmentFlags],
) -> Vec<EnvironmentEntry> {
    let (local, others): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .filter(|entry| {
            let tags = entry.environment_type;
            if exclude.iter().any(|flag| tags.intersects(*flag)) {
                return false;
            }
            include.is_empty() || include.iter().any(|flag| tags.intersects(*flag))
        })
        .partition(|entry| entry.environment_type.contains(EnvironmentFlags::LOCAL));

    local.into_iter().chain(others).collect()
}
