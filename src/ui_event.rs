use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    engine::SettingsSyncEngine,
    ring_light::{DisplayId, PointerPosition, RingBounds, SettingsMapping},
};

/// Events a presentation layer sends to the engine, one JSON object each.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Checkbox or slider change.
    Set {
        display: DisplayId,
        field: String,
        value: Value,
    },
    PointerDown {
        display: DisplayId,
        pointer: PointerPosition,
        bounds: RingBounds,
    },
    PointerMove {
        display: DisplayId,
        pointer: PointerPosition,
        bounds: RingBounds,
        buttons: u16,
    },
}

impl UiEvent {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        serde_json::from_str(line).map_err(|err| anyhow::anyhow!("bad ui event {:?}: {}", line, err))
    }

    /// Returns the new mapping, or `None` when the event changed nothing.
    pub async fn dispatch(
        self,
        engine: &SettingsSyncEngine,
    ) -> anyhow::Result<Option<SettingsMapping>> {
        let mapping = match self {
            UiEvent::Set {
                display,
                field,
                value,
            } => Some(engine.update_field(&display, &field, &value).await?),
            UiEvent::PointerDown {
                display,
                pointer,
                bounds,
            } => Some(engine.pick_color(&display, pointer, &bounds).await?),
            UiEvent::PointerMove {
                display,
                pointer,
                bounds,
                buttons,
            } => engine.drag_color(&display, pointer, &bounds, buttons).await?,
        };
        Ok(mapping)
    }
}
