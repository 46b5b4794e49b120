use crate::document::SettingsDocument;
use crate::error::Result;
use crate::storage::DocumentStorage;
use crate::sync::RwLockExt;
use crate::validate;

use log::debug;

use super::SettingsStore;

impl<S: DocumentStorage> SettingsStore<S> {
    /// Get the value stored under `key` in `section`.
    ///
    /// Returns `None` if the section or key does not exist, or if the first
    /// entry with that key has no `value` attribute. With duplicate keys the
    /// first one in document order wins.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if `section` or `key` is empty.
    pub fn get_value(&self, section: &str, key: &str) -> Result<Option<String>> {
        validate::section(section)?;
        validate::key(key)?;

        let document = self.document.read_recovered();
        Ok(document
            .section(section)
            .and_then(|s| s.find(key))
            .and_then(|entry| entry.value())
            .map(str::to_string))
    }

    /// Get every key/value pair in `section`, in document order.
    ///
    /// Returns `None` if the section does not exist. Entries without a key or
    /// without a value are skipped; duplicate keys are returned as stored.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if `section` is empty.
    pub fn get_values(&self, section: &str) -> Result<Option<Vec<(String, String)>>> {
        validate::section(section)?;

        let document = self.document.read_recovered();
        Ok(document.section(section).map(|s| s.pairs()))
    }

    /// Set `key` in `section` to `value` and save.
    ///
    /// The section is created if missing. An existing key keeps its position;
    /// a new key is appended.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidArgument` - Empty or non-XML section name, empty key,
    ///   or characters XML cannot store
    /// * `Error::DirectoryCreate` / `Error::FileWrite` - The save failed; the
    ///   in-memory change is kept
    pub fn set_value(&self, section: &str, key: &str, value: &str) -> Result<()> {
        validate::writable_section(section)?;
        validate::writable_entry(key, value)?;

        let mut document = self.document.write_recovered();
        apply(&mut document, section, key, value);
        self.persist(&document)
    }

    /// Set several keys in `section` and save once.
    ///
    /// All pairs are validated before any is applied, so an invalid pair
    /// leaves both the store and the file untouched. An empty `values` does
    /// not create the section but still saves.
    ///
    /// # Errors
    ///
    /// Same as [`set_value`](Self::set_value). If the save fails, every pair
    /// has already been applied in memory; call [`reload`](Self::reload) to
    /// discard them.
    pub fn set_values<I, K, V>(&self, section: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        validate::writable_section(section)?;

        let values: Vec<(K, V)> = values.into_iter().collect();
        for (key, value) in &values {
            validate::writable_entry(key.as_ref(), value.as_ref())?;
        }

        let mut document = self.document.write_recovered();
        for (key, value) in &values {
            apply(&mut document, section, key.as_ref(), value.as_ref());
        }
        debug!("Applied {} values to [{section}]", values.len());

        self.persist(&document)
    }

    /// Remove the first entry with `key` from `section` and save.
    ///
    /// Returns `false` (and does not save) if the section or key is missing.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` for empty arguments, or the save error.
    pub fn delete_value(&self, section: &str, key: &str) -> Result<bool> {
        validate::section(section)?;
        validate::key(key)?;

        let mut document = self.document.write_recovered();
        let removed = document
            .section_mut(section)
            .and_then(|s| s.remove(key))
            .is_some();
        if !removed {
            return Ok(false);
        }

        debug!("Deleted [{section}] {key}");
        self.persist(&document)?;
        Ok(true)
    }

    /// Remove the first section named `section`, with all its entries, and save.
    ///
    /// Returns `false` (and does not save) if the section is missing.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` for an empty name, or the save error.
    pub fn delete_section(&self, section: &str) -> Result<bool> {
        validate::section(section)?;

        let mut document = self.document.write_recovered();
        if document.remove_section(section).is_none() {
            return Ok(false);
        }

        debug!("Deleted section [{section}]");
        self.persist(&document)?;
        Ok(true)
    }
}

/// Upsert one pair without saving
fn apply(document: &mut SettingsDocument, section: &str, key: &str, value: &str) {
    if document.section_or_insert(section).upsert(key, value) {
        debug!("Added [{section}] {key}");
    } else {
        debug!("Updated [{section}] {key}");
    }
}
