//! Common test utilities for xml-settings integration tests
//!
//! Provides a temp-dir fixture and a storage backend that counts (and can
//! fail) saves.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;
use xml_settings::{
    DocumentStorage, Error, Result, SettingsDocument, SettingsStore, XmlStorage,
};

// =============================================================================
// Counting Storage
// =============================================================================

/// XML storage that records every save and can be told to fail them
#[derive(Clone, Default)]
pub struct CountingStorage {
    inner: XmlStorage,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of save attempts so far (failed ones included)
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every following save fail with a `FileWrite` error
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl DocumentStorage for CountingStorage {
    fn parse(&self, content: &str) -> Result<SettingsDocument> {
        self.inner.parse(content)
    }

    fn serialize(&self, document: &SettingsDocument) -> Result<String> {
        self.inner.serialize(document)
    }

    fn write(&self, path: &Path, document: &SettingsDocument) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::FileWrite {
                path: path.to_path_buf(),
                source: std::io::Error::other("simulated save failure"),
            });
        }
        self.inner.write(path, document)
    }
}

// =============================================================================
// Test Fixture
// =============================================================================

/// A store bound to `settings.xml` inside a fresh temp directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub path: PathBuf,
    pub storage: CountingStorage,
    pub store: SettingsStore<CountingStorage>,
}

impl TestFixture {
    pub fn new() -> Self {
        init_logging();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("settings.xml");
        let storage = CountingStorage::new();
        let store = open_counting(&path, storage.clone());

        Self {
            temp_dir,
            path,
            storage,
            store,
        }
    }

    /// Fixture whose settings file already holds `content`
    pub fn with_file(content: &str) -> Self {
        init_logging();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("settings.xml");
        std::fs::write(&path, content).expect("Failed to write settings file");
        let storage = CountingStorage::new();
        let store = open_counting(&path, storage.clone());

        Self {
            temp_dir,
            path,
            storage,
            store,
        }
    }

    /// Open a second, independent store on the same file
    pub fn reopen(&self) -> SettingsStore {
        SettingsStore::new(&self.path).expect("Failed to reopen store")
    }

    /// Current file contents
    pub fn file_contents(&self) -> String {
        read_settings_file(&self.path)
    }
}

fn open_counting(path: &Path, storage: CountingStorage) -> SettingsStore<CountingStorage> {
    SettingsStore::builder(path)
        .build_with_storage(storage)
        .expect("Failed to open store")
}

/// Read the settings file as a string
pub fn read_settings_file(path: &Path) -> String {
    std::fs::read_to_string(path).expect("Failed to read settings file")
}

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Build an owned pair list
pub fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
