use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::ring_light::DisplayId;

use super::BackendControl;

/// One backend call, as handed to the overlay process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendCommand {
    SetEnabled {
        enabled: bool,
    },
    SetColor {
        display_id: DisplayId,
        r: u8,
        g: u8,
        b: u8,
    },
    SetBrightness {
        display_id: DisplayId,
        value: i32,
    },
    SetWidth {
        display_id: DisplayId,
        value: i32,
    },
    ToggleMonitor {
        display_id: DisplayId,
        enabled: bool,
    },
}

/// [`BackendControl`] that forwards every call as a [`BackendCommand`].
#[derive(Clone, Debug)]
pub struct ChannelBackend {
    command_sender: mpsc::UnboundedSender<BackendCommand>,
}

impl ChannelBackend {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackendCommand>) {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        (Self { command_sender }, command_receiver)
    }

    fn send(&self, command: BackendCommand) -> anyhow::Result<()> {
        self.command_sender
            .send(command)
            .map_err(|err| anyhow::anyhow!("overlay backend is gone, dropped {:?}", err.0))
    }
}

impl BackendControl for ChannelBackend {
    fn set_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        self.send(BackendCommand::SetEnabled { enabled })
    }

    fn set_color(&self, display_id: &str, r: u8, g: u8, b: u8) -> anyhow::Result<()> {
        self.send(BackendCommand::SetColor {
            display_id: display_id.to_string(),
            r,
            g,
            b,
        })
    }

    fn set_brightness(&self, display_id: &str, value: i32) -> anyhow::Result<()> {
        self.send(BackendCommand::SetBrightness {
            display_id: display_id.to_string(),
            value,
        })
    }

    fn set_width(&self, display_id: &str, value: i32) -> anyhow::Result<()> {
        self.send(BackendCommand::SetWidth {
            display_id: display_id.to_string(),
            value,
        })
    }

    fn toggle_monitor(&self, display_id: &str, enabled: bool) -> anyhow::Result<()> {
        self.send(BackendCommand::ToggleMonitor {
            display_id: display_id.to_string(),
            enabled,
        })
    }
}
