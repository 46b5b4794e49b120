use crate::config::StoreConfig;
use crate::document::SettingsDocument;
use crate::error::Result;
use crate::security;
use crate::storage::{DocumentStorage, XmlStorage};
use crate::sync::RwLockExt;

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::SettingsStoreBuilder;

/// Sectioned key/value settings bound to one XML file.
///
/// The whole document is held in memory. Every mutating call updates the
/// in-memory document and then rewrites the file before returning;
/// [`set_values`](Self::set_values) applies all of its pairs first and writes
/// once.
///
/// The document sits behind an `RwLock`, so a store can be shared between
/// threads with `Arc`. Writers hold the lock across the save, which
/// serializes mutations made through the same store. Nothing guards against
/// other processes or other stores writing the same file: the last save wins.
///
/// # Example
///
/// ```rust,no_run
/// use xml_settings::SettingsStore;
///
/// let store = SettingsStore::new("/tmp/my-app/settings.xml")?;
/// store.set_value("Window", "width", "1280")?;
/// assert_eq!(store.get_value("Window", "width")?, Some("1280".to_string()));
/// # Ok::<(), xml_settings::Error>(())
/// ```
#[derive(Debug)]
pub struct SettingsStore<S: DocumentStorage = XmlStorage> {
    /// Configuration (bound path, root element, storage backend)
    pub(crate) config: StoreConfig<S>,

    /// In-memory copy of the settings file
    pub(crate) document: RwLock<SettingsDocument>,
}

impl SettingsStore {
    /// Open the settings file at `path`, or start an empty document if the
    /// file does not exist yet.
    ///
    /// Nothing is written until the first mutation.
    ///
    /// # Errors
    ///
    /// * `Error::Load` - The file exists but is not a settings document
    /// * `Error::FileRead` - The file exists but cannot be read
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(StoreConfig::new(path))
    }

    /// Create a builder for `SettingsStore` with a fluent API.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use xml_settings::SettingsStore;
    ///
    /// let store = SettingsStore::builder("/tmp/my-app/settings.xml")
    ///     .root_element("configuration")
    ///     .secure_permissions(true)
    ///     .build()?;
    /// # Ok::<(), xml_settings::Error>(())
    /// ```
    pub fn builder(path: impl Into<PathBuf>) -> SettingsStoreBuilder {
        SettingsStoreBuilder::new(path)
    }
}

impl<S: DocumentStorage> SettingsStore<S> {
    /// Open a store with an explicit configuration.
    ///
    /// # Errors
    ///
    /// * `Error::Config` - The configuration is invalid
    /// * `Error::Load` / `Error::FileRead` - As for [`SettingsStore::new`]
    pub fn with_config(config: StoreConfig<S>) -> Result<Self> {
        config.validate()?;

        let document = config
            .storage
            .load_or_create(&config.root_element, &config.path)?;

        info!(
            "Initialized settings store at {} ({} sections)",
            config.path.display(),
            document.sections().count()
        );

        Ok(Self {
            config,
            document: RwLock::new(document),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig<S> {
        &self.config
    }

    /// Path of the bound settings file
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Name of the document root element
    pub fn root_element(&self) -> &str {
        &self.config.root_element
    }

    /// Section names in document order, duplicates included
    pub fn sections(&self) -> Vec<String> {
        self.document.read_recovered().section_names()
    }

    /// Owned copy of the in-memory document
    pub fn snapshot(&self) -> SettingsDocument {
        self.document.read_recovered().clone()
    }

    /// Replace the in-memory document with the current file contents.
    ///
    /// Use this after a failed save, or after the file was edited by hand.
    /// A missing file resets the store to an empty document.
    ///
    /// # Errors
    ///
    /// Same as construction; on error the in-memory document is unchanged.
    pub fn reload(&self) -> Result<()> {
        let fresh = self
            .config
            .storage
            .load_or_create(&self.config.root_element, &self.config.path)?;

        *self.document.write_recovered() = fresh;
        debug!("Reloaded settings from {}", self.config.path.display());
        Ok(())
    }

    /// Write the whole document to the bound path
    pub(crate) fn persist(&self, document: &SettingsDocument) -> Result<()> {
        let path = &self.config.path;

        if self.config.secure_permissions {
            if let Some(parent) = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty() && !p.exists())
            {
                security::ensure_secure_dir(parent)?;
            }
        }

        self.config
            .storage
            .write(path, document)
            .inspect_err(|e| warn!("Failed to save settings to {}: {e}", path.display()))?;

        if self.config.secure_permissions {
            security::set_secure_file_permissions(path)?;
        }

        debug!("Saved settings to {}", path.display());
        Ok(())
    }
}
