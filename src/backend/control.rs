use futures::future::BoxFuture;

use crate::ring_light::DisplayId;

const WIN32_DEVICE_PREFIX: &str = r"\\.\";

/// Imperative control surface of the overlay backend.
///
/// Calls are fire-and-forget: an `Ok` only means the call was handed over,
/// not that the overlay applied it.
pub trait BackendControl: Send + Sync {
    /// Global master switch for every overlay.
    fn set_enabled(&self, enabled: bool) -> anyhow::Result<()>;

    fn set_color(&self, display_id: &str, r: u8, g: u8, b: u8) -> anyhow::Result<()>;

    fn set_brightness(&self, display_id: &str, value: i32) -> anyhow::Result<()>;

    fn set_width(&self, display_id: &str, value: i32) -> anyhow::Result<()>;

    fn toggle_monitor(&self, display_id: &str, enabled: bool) -> anyhow::Result<()>;
}

pub trait DisplayEnumerator: Send + Sync {
    fn enumerate_displays(&self) -> BoxFuture<'_, anyhow::Result<Vec<DisplayId>>>;
}

/// Enumerates a fixed list of displays, e.g. from the engine config.
#[derive(Clone, Debug, Default)]
pub struct StaticDisplayEnumerator {
    displays: Vec<DisplayId>,
}

impl StaticDisplayEnumerator {
    pub fn new<I, S>(displays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            displays: displays
                .into_iter()
                .map(|name| normalize_display_id(name.as_ref()))
                .collect(),
        }
    }
}

impl DisplayEnumerator for StaticDisplayEnumerator {
    fn enumerate_displays(&self) -> BoxFuture<'_, anyhow::Result<Vec<DisplayId>>> {
        let displays = self.displays.clone();
        Box::pin(async move { Ok(displays) })
    }
}

/// `\\.\DISPLAY1` -> `DISPLAY1`
pub fn normalize_display_id(raw: &str) -> DisplayId {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(WIN32_DEVICE_PREFIX)
        .unwrap_or(trimmed)
        .to_string()
}
