//! Resolved, immutable configuration for a sync run
//!
//! Settings are read once at process start from a YAML file and then handed
//! by reference (usually behind an `Arc`) to every component that needs them.
//! Loading is the only step whose failure aborts the whole process.

mod error;
mod loader;
mod model;

pub use error::SettingsError;
pub use loader::DEFAULT_CONFIG_PATH;
pub use model::{InputMethod, OsFamily, Settings};
