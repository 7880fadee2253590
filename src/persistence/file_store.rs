use std::path::{Path, PathBuf};

use dirs::config_dir;
use futures::future::BoxFuture;
use paris::info;
use serde_json::{Map, Value};
use tokio::{fs, sync::Mutex};

use super::SettingsPersistence;

const SETTINGS_FILE_NAME: &str = "cc.ivanli.ring_light/settings.json";

/// All settings as one JSON object (key -> value) in a single file.
#[derive(Debug)]
pub struct JsonFileSettingsPersistence {
    path: PathBuf,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl JsonFileSettingsPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store under the user's config directory.
    pub fn in_config_dir() -> anyhow::Result<Self> {
        Ok(Self::new(Self::get_config_path()?))
    }

    fn get_config_path() -> anyhow::Result<PathBuf> {
        let config_dir =
            config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole key-value object. A missing file reads as empty.
    pub async fn load_config(&self) -> anyhow::Result<Map<String, Value>> {
        let _guard = self.lock.lock().await;
        self.read_file().await
    }

    /// Replace the whole key-value object.
    pub async fn save_config(&self, config: &Map<String, Value>) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        self.write_file(config).await
    }

    async fn read_file(&self) -> anyhow::Result<Map<String, Value>> {
        if !fs::try_exists(&self.path).await? {
            info!("settings file {} not found, starting empty", self.path.display());
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            other => Err(anyhow::anyhow!(
                "settings file {} holds {} instead of an object",
                self.path.display(),
                json_kind(&other)
            )),
        }
    }

    async fn write_file(&self, config: &Map<String, Value>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(config)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

impl SettingsPersistence for JsonFileSettingsPersistence {
    fn get_setting<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
        Box::pin(async move {
            let config = self.load_config().await?;
            Ok(config.get(key).cloned())
        })
    }

    fn set_setting<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut config = self.read_file().await?;
            config.insert(key.to_string(), value);
            self.write_file(&config).await
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
