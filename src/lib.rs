//! # xml-settings
//!
//! Sectioned key/value settings persisted to a single, human-editable XML file.
//!
//! ## Features
//!
//! - **Sections and keys**: string values grouped under named sections
//! - **Write-through**: every change is saved before the call returns
//! - **Batch updates**: `set_values` applies many keys with a single save
//! - **Load or create**: a missing file starts as an empty document
//! - **Atomic saves**: temp file + rename, so the file is never half-written
//! - **Thread-safe**: share one store across threads with `Arc`
//! - **Hand edits kept**: comments, extra attributes and unknown elements
//!   are written back unchanged
//!
//! ## File Format
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <settings>
//!   <Window>
//!     <add key="width" value="1280"/>
//!     <add key="height" value="720"/>
//!   </Window>
//! </settings>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xml_settings::SettingsStore;
//!
//! # fn example() -> xml_settings::Result<()> {
//! let store = SettingsStore::new("/tmp/my-app/settings.xml")?;
//!
//! store.set_value("Window", "width", "1280")?;
//! store.set_values("Window", [("height", "720"), ("maximized", "false")])?;
//!
//! assert_eq!(store.get_value("Window", "width")?.as_deref(), Some("1280"));
//! for (key, value) in store.get_values("Window")?.unwrap_or_default() {
//!     println!("{key} = {value}");
//! }
//!
//! store.delete_value("Window", "maximized")?;
//! store.delete_section("Window")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Lookup Rules
//!
//! Section names and keys match exactly (case-sensitive). If a hand-edited
//! file contains the same section or key twice, the first one in document
//! order is the one read, updated and deleted. `get_values` skips `<add>`
//! elements that have no `key` or no `value` attribute.
//!
//! ## Concurrency
//!
//! One store serializes its own writers. Two stores (or two processes) bound
//! to the same file do not coordinate; the last save wins. Call
//! [`SettingsStore::reload`] to pick up external edits.

// Core modules
mod error;
mod store;
mod sync;
mod validate;

pub mod config;
pub mod document;
pub mod security;
pub mod storage;

// Re-exports from core
pub use config::{StoreConfig, StoreConfigBuilder};
pub use document::{Attribute, Entry, Node, Section, SettingsDocument, DEFAULT_ROOT_ELEMENT};
pub use error::{Error, Result};
pub use storage::{DocumentStorage, XmlStorage};
pub use store::{Settings, SettingsStore, SettingsStoreBuilder};
pub use validate::is_element_name;
