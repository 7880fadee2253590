use std::collections::HashMap;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;

use super::SettingsPersistence;

/// Keeps settings in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsPersistence {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettingsPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: Value) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value);
        Self {
            values: RwLock::new(values),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.values.read().await.get(key).cloned()
    }
}

impl SettingsPersistence for MemorySettingsPersistence {
    fn get_setting<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
        Box::pin(async move { Ok(self.get(key).await) })
    }

    fn set_setting<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.values.write().await.insert(key.to_string(), value);
            Ok(())
        })
    }
}
