use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 显示器标识，由显示器枚举方提供，进程生命周期内保持稳定
pub type DisplayId = String;

pub const DEFAULT_COLOR: &str = "#FFEE08";
pub const DEFAULT_BRIGHTNESS: i32 = 200;
pub const DEFAULT_WIDTH: i32 = 30;

pub const MIN_BRIGHTNESS: i32 = 0;
pub const MAX_BRIGHTNESS: i32 = 255;
pub const MIN_WIDTH: i32 = 1;
pub const MAX_WIDTH: i32 = 150;

/// 单个显示器的光环设置，缺失的字段取默认值
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsRecord {
    pub enabled: bool,
    /// `#RRGGBB`
    pub color: String,
    pub brightness: i32,
    pub width: i32,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            enabled: false,
            color: DEFAULT_COLOR.to_string(),
            brightness: DEFAULT_BRIGHTNESS,
            width: DEFAULT_WIDTH,
        }
    }
}

impl SettingsRecord {
    /// 仅替换变更对应的字段，其余字段保持不变
    pub fn with_change(&self, change: &SettingChange) -> Self {
        let mut record = self.clone();
        match change {
            SettingChange::Enabled(enabled) => record.enabled = *enabled,
            SettingChange::Color(color) => record.color = color.clone(),
            SettingChange::Brightness(brightness) => record.brightness = *brightness,
            SettingChange::Width(width) => record.width = *width,
        }
        record
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingField {
    Enabled,
    Color,
    Brightness,
    Width,
}

impl SettingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingField::Enabled => "enabled",
            SettingField::Color => "color",
            SettingField::Brightness => "brightness",
            SettingField::Width => "width",
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(SettingField::Enabled),
            "color" => Ok(SettingField::Color),
            "brightness" => Ok(SettingField::Brightness),
            "width" => Ok(SettingField::Width),
            other => Err(anyhow::anyhow!("unknown setting field: {}", other)),
        }
    }
}

/// 对单个字段的一次修改
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingChange {
    Enabled(bool),
    Color(String),
    Brightness(i32),
    Width(i32),
}

impl SettingChange {
    pub fn field(&self) -> SettingField {
        match self {
            SettingChange::Enabled(_) => SettingField::Enabled,
            SettingChange::Color(_) => SettingField::Color,
            SettingChange::Brightness(_) => SettingField::Brightness,
            SettingChange::Width(_) => SettingField::Width,
        }
    }

    /// Build a change from a field name and a JSON value, as sent by a
    /// presentation layer.
    pub fn from_json(field: SettingField, value: &Value) -> anyhow::Result<Self> {
        let change = match field {
            SettingField::Enabled => SettingChange::Enabled(
                value
                    .as_bool()
                    .ok_or_else(|| anyhow::anyhow!("enabled expects a boolean, got {}", value))?,
            ),
            SettingField::Color => SettingChange::Color(
                value
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("color expects a string, got {}", value))?
                    .to_string(),
            ),
            SettingField::Brightness => SettingChange::Brightness(json_int(field, value)?),
            SettingField::Width => SettingChange::Width(json_int(field, value)?),
        };
        Ok(change)
    }

    /// Brightness into `0..=255`, width into `1..=150`. Other fields are
    /// returned as is.
    pub fn clamped(self) -> Self {
        match self {
            SettingChange::Brightness(value) => {
                SettingChange::Brightness(value.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS))
            }
            SettingChange::Width(value) => SettingChange::Width(value.clamp(MIN_WIDTH, MAX_WIDTH)),
            other => other,
        }
    }
}

fn json_int(field: SettingField, value: &Value) -> anyhow::Result<i32> {
    let number = value
        .as_i64()
        .or_else(|| value.as_f64().map(|v| v.round() as i64))
        .ok_or_else(|| anyhow::anyhow!("{} expects an integer, got {}", field, value))?;

    i32::try_from(number).map_err(|_| anyhow::anyhow!("{} out of range: {}", field, number))
}

/// 显示器 → 设置 的映射，序列化后即为持久化的 `monitorSettings` 值
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsMapping(BTreeMap<DisplayId, SettingsRecord>);

impl SettingsMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, display_id: &str) -> Option<&SettingsRecord> {
        self.0.get(display_id)
    }

    pub fn insert(&mut self, display_id: DisplayId, record: SettingsRecord) {
        self.0.insert(display_id, record);
    }

    pub fn contains(&self, display_id: &str) -> bool {
        self.0.contains_key(display_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DisplayId, &SettingsRecord)> {
        self.0.iter()
    }

    /// Functional update: a new mapping where only `change` is applied to the
    /// record of `display_id`. A missing record starts from the default.
    pub fn with_change(&self, display_id: &str, change: &SettingChange) -> Self {
        let base = self.get(display_id).cloned().unwrap_or_default();

        let mut mapping = self.clone();
        mapping.insert(display_id.to_string(), base.with_change(change));
        mapping
    }

    pub fn to_value(&self) -> anyhow::Result<Value> {
        serde_json::to_value(self).map_err(|err| anyhow::anyhow!("serialize settings: {}", err))
    }
}

impl FromIterator<(DisplayId, SettingsRecord)> for SettingsMapping {
    fn from_iter<T: IntoIterator<Item = (DisplayId, SettingsRecord)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
