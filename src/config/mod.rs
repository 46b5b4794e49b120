//! Store configuration
//!
//! - `StoreConfig` - Where the settings file lives and how it is written
//! - `StoreConfigBuilder` - Fluent construction of `StoreConfig`

mod types;

pub use types::{StoreConfig, StoreConfigBuilder};
