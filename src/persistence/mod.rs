mod debounced_writer;
mod file_store;
mod memory_store;

pub use debounced_writer::*;
pub use file_store::*;
pub use memory_store::*;

use futures::future::BoxFuture;
use serde_json::Value;

/// Key under which the full settings mapping is persisted.
pub const MONITOR_SETTINGS_KEY: &str = "monitorSettings";

/// Opaque key-value storage for JSON values.
pub trait SettingsPersistence: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn get_setting<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Value>>>;

    fn set_setting<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, anyhow::Result<()>>;
}
