use super::{SettingChange, SettingsMapping, SettingsRecord};

/// Owns the live [`SettingsMapping`]. Nothing else mutates it.
#[derive(Debug, Default)]
pub struct SettingsStore {
    mapping: SettingsMapping,
    clamp_values: bool,
    seeded: bool,
}

impl SettingsStore {
    pub fn new(clamp_values: bool) -> Self {
        Self {
            mapping: SettingsMapping::new(),
            clamp_values,
            seeded: false,
        }
    }

    /// Replace the whole mapping, used once the bootstrap has reconciled it.
    pub fn seed(&mut self, mapping: SettingsMapping) {
        self.mapping = mapping;
        self.seeded = true;
    }

    /// Whether the mapping holds the reconciled settings yet.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn get(&self, display_id: &str) -> SettingsRecord {
        self.mapping.get(display_id).cloned().unwrap_or_default()
    }

    pub fn snapshot(&self) -> SettingsMapping {
        self.mapping.clone()
    }

    /// The change that will actually be stored for `change`.
    pub fn normalize(&self, change: SettingChange) -> SettingChange {
        if self.clamp_values {
            change.clamped()
        } else {
            change
        }
    }

    /// Apply a single-field change and return the resulting mapping.
    pub fn update(&mut self, display_id: &str, change: &SettingChange) -> SettingsMapping {
        let mapping = self.mapping.with_change(display_id, change);
        self.mapping = mapping.clone();
        mapping
    }
}
