use std::sync::Arc;

use paris::warn;

use crate::{
    color::RgbColor,
    ring_light::{SettingChange, SettingsRecord},
};

use super::BackendControl;

/// Maps settings changes onto backend calls. Backend failures are logged and
/// swallowed here, never returned to the caller.
#[derive(Clone)]
pub struct BackendSyncAdapter {
    backend: Arc<dyn BackendControl>,
}

impl BackendSyncAdapter {
    pub fn new(backend: Arc<dyn BackendControl>) -> Self {
        Self { backend }
    }

    pub fn apply(&self, display_id: &str, change: &SettingChange) {
        let result = match change {
            SettingChange::Color(color) => match RgbColor::from_hex(color) {
                Ok(rgb) => {
                    let [r, g, b] = rgb.get_rgb();
                    self.backend.set_color(display_id, r, g, b)
                }
                Err(err) => {
                    log::debug!("skip set_color for {}: {}", display_id, err);
                    return;
                }
            },
            SettingChange::Brightness(value) => self.backend.set_brightness(display_id, *value),
            SettingChange::Width(value) => self.backend.set_width(display_id, *value),
            SettingChange::Enabled(enabled) => self.backend.toggle_monitor(display_id, *enabled),
        };

        if let Err(err) = result {
            warn!(
                "backend call for {} ({}) failed: {}",
                display_id,
                change.field(),
                err
            );
        }
    }

    /// Push every field of a restored record: color, brightness, width, enabled.
    pub fn apply_record(&self, display_id: &str, record: &SettingsRecord) {
        self.apply(display_id, &SettingChange::Color(record.color.clone()));
        self.apply(display_id, &SettingChange::Brightness(record.brightness));
        self.apply(display_id, &SettingChange::Width(record.width));
        self.apply(display_id, &SettingChange::Enabled(record.enabled));
    }

    pub fn set_master_enabled(&self, enabled: bool) {
        if let Err(err) = self.backend.set_enabled(enabled) {
            warn!("backend set_enabled({}) failed: {}", enabled, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCommand, ChannelBackend};

    fn adapter() -> (
        BackendSyncAdapter,
        tokio::sync::mpsc::UnboundedReceiver<BackendCommand>,
    ) {
        let (backend, rx) = ChannelBackend::new();
        (BackendSyncAdapter::new(Arc::new(backend)), rx)
    }

    #[test]
    fn test_field_mapping() {
        let (adapter, mut rx) = adapter();

        adapter.apply("DP-1", &SettingChange::Color("#FFEE08".to_string()));
        adapter.apply("DP-1", &SettingChange::Brightness(120));
        adapter.apply("DP-1", &SettingChange::Width(12));
        adapter.apply("DP-1", &SettingChange::Enabled(true));

        let id = "DP-1".to_string();
        assert_eq!(
            rx.try_recv().unwrap(),
            BackendCommand::SetColor {
                display_id: id.clone(),
                r: 0xff,
                g: 0xee,
                b: 0x08
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            BackendCommand::SetBrightness {
                display_id: id.clone(),
                value: 120
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            BackendCommand::SetWidth {
                display_id: id.clone(),
                value: 12
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            BackendCommand::ToggleMonitor {
                display_id: id,
                enabled: true
            }
        );
    }

    #[test]
    fn test_malformed_color_is_skipped() {
        let (adapter, mut rx) = adapter();

        adapter.apply("DP-1", &SettingChange::Color("#ZZZZZZ".to_string()));

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_backend_failure_is_swallowed() {
        let (adapter, rx) = adapter();
        drop(rx);

        adapter.apply("DP-1", &SettingChange::Width(12));
        adapter.set_master_enabled(true);
    }

    #[test]
    fn test_apply_record_order() {
        let (adapter, mut rx) = adapter();
        let record = SettingsRecord {
            enabled: true,
            color: "#00FF00".to_string(),
            brightness: 100,
            width: 10,
        };

        adapter.apply_record("DP-1", &record);

        let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|command| match command {
                BackendCommand::SetColor { .. } => "color",
                BackendCommand::SetBrightness { .. } => "brightness",
                BackendCommand::SetWidth { .. } => "width",
                BackendCommand::ToggleMonitor { .. } => "enabled",
                BackendCommand::SetEnabled { .. } => "master",
            })
            .collect();
        assert_eq!(kinds, vec!["color", "brightness", "width", "enabled"]);
    }
}
