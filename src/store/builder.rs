//! Builder for SettingsStore
//!
//! This module contains [`SettingsStoreBuilder`] which provides a fluent API
//! for opening a [`SettingsStore`](super::SettingsStore).

use crate::config::StoreConfigBuilder;
use crate::error::Result;
use crate::storage::{DocumentStorage, XmlStorage};
use std::path::PathBuf;

use super::SettingsStore;

/// Builder for opening a [`SettingsStore`] with a fluent API.
///
/// # Example
///
/// ```rust,no_run
/// use xml_settings::SettingsStore;
///
/// let store = SettingsStore::builder("app.config.xml")
///     .root_element("configuration")
///     .indent(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct SettingsStoreBuilder {
    config_builder: StoreConfigBuilder,
}

impl SettingsStoreBuilder {
    /// Create a new builder bound to the given settings file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config_builder: StoreConfigBuilder::new(path),
        }
    }

    /// Set the document root element name (default: "settings").
    pub fn root_element(mut self, name: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.root_element(name);
        self
    }

    /// Indent each nesting level by `spaces` (default: 2).
    pub fn indent(mut self, spaces: usize) -> Self {
        self.config_builder = self.config_builder.indent(spaces);
        self
    }

    /// Write compact XML.
    pub fn compact(mut self) -> Self {
        self.config_builder = self.config_builder.compact();
        self
    }

    /// Restrict the settings file to its owner after each save.
    pub fn secure_permissions(mut self, enabled: bool) -> Self {
        self.config_builder = self.config_builder.secure_permissions(enabled);
        self
    }

    /// Open the [`SettingsStore`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an existing file
    /// cannot be loaded.
    pub fn build(self) -> Result<SettingsStore<XmlStorage>> {
        SettingsStore::with_config(self.config_builder.build())
    }

    /// Open the [`SettingsStore`] on a custom storage backend.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Self::build).
    pub fn build_with_storage<S: DocumentStorage>(self, storage: S) -> Result<SettingsStore<S>> {
        SettingsStore::with_config(self.config_builder.build_with_storage(storage))
    }
}
