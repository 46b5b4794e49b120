//! Settings store
//!
//! This module contains [`SettingsStore`], the primary entry point, and the
//! object-safe [`Settings`] trait for hosts that want to depend on an
//! abstraction instead of a concrete store.

mod builder;
mod core;
mod operations;

pub use builder::SettingsStoreBuilder;
pub use self::core::SettingsStore;

use crate::error::Result;
use crate::storage::DocumentStorage;

/// Section/key settings access.
///
/// Implemented by [`SettingsStore`]; use `&dyn Settings` or
/// `Arc<dyn Settings + Send + Sync>` to inject a store into code that should
/// not care where settings live.
pub trait Settings {
    /// See [`SettingsStore::get_value`]
    fn get_value(&self, section: &str, key: &str) -> Result<Option<String>>;

    /// See [`SettingsStore::get_values`]
    fn get_values(&self, section: &str) -> Result<Option<Vec<(String, String)>>>;

    /// See [`SettingsStore::set_value`]
    fn set_value(&self, section: &str, key: &str, value: &str) -> Result<()>;

    /// See [`SettingsStore::set_values`]
    fn set_values(&self, section: &str, values: &[(String, String)]) -> Result<()>;

    /// See [`SettingsStore::delete_value`]
    fn delete_value(&self, section: &str, key: &str) -> Result<bool>;

    /// See [`SettingsStore::delete_section`]
    fn delete_section(&self, section: &str) -> Result<bool>;
}

impl<S: DocumentStorage> Settings for SettingsStore<S> {
    fn get_value(&self, section: &str, key: &str) -> Result<Option<String>> {
        SettingsStore::get_value(self, section, key)
    }

    fn get_values(&self, section: &str) -> Result<Option<Vec<(String, String)>>> {
        SettingsStore::get_values(self, section)
    }

    fn set_value(&self, section: &str, key: &str, value: &str) -> Result<()> {
        SettingsStore::set_value(self, section, key, value)
    }

    fn set_values(&self, section: &str, values: &[(String, String)]) -> Result<()> {
        SettingsStore::set_values(
            self,
            section,
            values.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
    }

    fn delete_value(&self, section: &str, key: &str) -> Result<bool> {
        SettingsStore::delete_value(self, section, key)
    }

    fn delete_section(&self, section: &str) -> Result<bool> {
        SettingsStore::delete_section(self, section)
    }
}
