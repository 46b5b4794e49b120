//! Store configuration types

use std::path::PathBuf;

use crate::document::DEFAULT_ROOT_ELEMENT;
use crate::error::{Error, Result};
use crate::storage::{DocumentStorage, XmlStorage};
use crate::validate;

/// Configuration for initializing a [`SettingsStore`](crate::SettingsStore)
#[derive(Debug, Clone)]
pub struct StoreConfig<S: DocumentStorage = XmlStorage> {
    /// File the store loads from and saves to
    pub path: PathBuf,

    /// Name of the document root element (default: "settings")
    pub root_element: String,

    /// Storage backend implementation
    pub storage: S,

    /// Restrict the settings file to its owner after every save (Unix only)
    pub secure_permissions: bool,
}

impl StoreConfig<XmlStorage> {
    /// Default configuration for the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfigBuilder::new(path).build()
    }

    /// Create a new builder for StoreConfig
    ///
    /// # Example
    /// ```rust
    /// use xml_settings::StoreConfig;
    ///
    /// let config = StoreConfig::builder("/tmp/my-app/settings.xml")
    ///     .root_element("configuration")
    ///     .compact()
    ///     .build();
    /// assert_eq!(config.root_element, "configuration");
    /// ```
    pub fn builder(path: impl Into<PathBuf>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(path)
    }
}

impl<S: DocumentStorage> StoreConfig<S> {
    /// Check the configuration before a store is opened with it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the root element is not a valid XML name
    /// or the path has no file name component.
    pub fn validate(&self) -> Result<()> {
        if !validate::is_element_name(&self.root_element) {
            return Err(Error::Config(format!(
                "root element '{}' is not a valid XML element name",
                self.root_element
            )));
        }
        if self.path.file_name().is_none() {
            return Err(Error::Config(format!(
                "Invalid path '{}': must have a filename",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Builder for creating StoreConfig with a fluent API
#[derive(Debug, Clone)]
pub struct StoreConfigBuilder {
    path: PathBuf,
    root_element: String,
    indent: Option<usize>,
    secure_permissions: bool,
}

impl StoreConfigBuilder {
    /// Create a new builder for the given settings file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            root_element: DEFAULT_ROOT_ELEMENT.into(),
            indent: Some(2),
            secure_permissions: false,
        }
    }

    /// Set the document root element name (default: "settings")
    pub fn root_element(mut self, name: impl Into<String>) -> Self {
        self.root_element = name.into();
        self
    }

    /// Indent each nesting level by `spaces` (default: 2)
    pub fn indent(mut self, spaces: usize) -> Self {
        self.indent = Some(spaces);
        self
    }

    /// Write compact XML (no indentation or line breaks)
    pub fn compact(mut self) -> Self {
        self.indent = None;
        self
    }

    /// Restrict the settings file (and a directory the store creates for it)
    /// to the owner. No-op on non-Unix platforms.
    pub fn secure_permissions(mut self, enabled: bool) -> Self {
        self.secure_permissions = enabled;
        self
    }

    /// Build the StoreConfig with the default XML storage
    pub fn build(self) -> StoreConfig<XmlStorage> {
        let storage = match self.indent {
            Some(spaces) => XmlStorage::with_indent(spaces),
            None => XmlStorage::compact(),
        };
        self.build_with_storage(storage)
    }

    /// Build the StoreConfig with a custom storage backend.
    ///
    /// Formatting options (`indent`, `compact`) only apply to [`XmlStorage`]
    /// and are ignored here.
    pub fn build_with_storage<S: DocumentStorage>(self, storage: S) -> StoreConfig<S> {
        StoreConfig {
            path: self.path,
            root_element: self.root_element,
            storage,
            secure_permissions: self.secure_permissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = StoreConfig::builder("/tmp/app/settings.xml").build();

        assert_eq!(config.path, PathBuf::from("/tmp/app/settings.xml"));
        assert_eq!(config.root_element, "settings");
        assert!(!config.secure_permissions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_with_options() {
        let config = StoreConfig::builder("app.xml")
            .root_element("configuration")
            .indent(4)
            .secure_permissions(true)
            .build();

        assert_eq!(config.path, PathBuf::from("app.xml"));
        assert_eq!(config.root_element, "configuration");
        assert!(config.secure_permissions);
    }

    #[test]
    fn test_validate_rejects_bad_root() {
        let config = StoreConfig::builder("app.xml")
            .root_element("not valid")
            .build();

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_path_without_filename() {
        let config = StoreConfig::new("/");

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
