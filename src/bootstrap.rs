use std::{collections::BTreeSet, sync::Arc, time::Duration};

use paris::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::{
    backend::{BackendSyncAdapter, DisplayEnumerator},
    persistence::SettingsPersistence,
    ring_light::{DisplayId, SettingChange, SettingsMapping, SettingsRecord},
};

/// 启动流程状态
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum BootstrapState {
    Idle,
    Enumerating,
    Reconciling,
    Applying,
    Ready,
    Failed(String),
}

impl BootstrapState {
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapState::Ready)
    }
}

/// 等待后端就绪的方式
#[derive(Debug)]
pub enum WarmUp {
    /// 固定延时
    Delay(Duration),
    /// 等待后端发出就绪信号（值变为 `true`）
    ReadySignal(watch::Receiver<bool>),
}

/// 对账结果：最终的设置映射，以及其中来自持久化的显示器
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Reconciliation {
    pub mapping: SettingsMapping,
    pub restored: BTreeSet<DisplayId>,
}

/// 启动时：枚举显示器、读取持久化设置、对账、推送到后端。每个进程只运行一次。
pub struct BootstrapSequencer {
    enumerator: Arc<dyn DisplayEnumerator>,
    persistence: Arc<dyn SettingsPersistence>,
    adapter: BackendSyncAdapter,
    settings_key: String,
    warm_up: WarmUp,
    state_sender: watch::Sender<BootstrapState>,
}

impl BootstrapSequencer {
    pub fn new(
        enumerator: Arc<dyn DisplayEnumerator>,
        persistence: Arc<dyn SettingsPersistence>,
        adapter: BackendSyncAdapter,
        settings_key: impl Into<String>,
        warm_up: WarmUp,
    ) -> Self {
        let (state_sender, _) = watch::channel(BootstrapState::Idle);
        Self {
            enumerator,
            persistence,
            adapter,
            settings_key: settings_key.into(),
            warm_up,
            state_sender,
        }
    }

    pub fn set_warm_up(&mut self, warm_up: WarmUp) {
        self.warm_up = warm_up;
    }

    pub fn subscribe_state(&self) -> watch::Receiver<BootstrapState> {
        self.state_sender.subscribe()
    }

    /// Consumes the sequencer, so it cannot run twice.
    pub async fn run(mut self) -> anyhow::Result<SettingsMapping> {
        self.wait_for_backend().await;

        self.transition(BootstrapState::Enumerating);
        let displays = match self.enumerator.enumerate_displays().await {
            Ok(displays) => displays,
            Err(err) => {
                error!("Failed to enumerate displays: {}", err);
                self.transition(BootstrapState::Failed(err.to_string()));
                return Err(err.context("display enumeration failed"));
            }
        };
        info!("🖥️ {} display(s) detected", displays.len());

        self.transition(BootstrapState::Reconciling);
        let persisted = self.load_persisted().await;
        let reconciliation = reconcile(&displays, persisted.as_ref());

        self.transition(BootstrapState::Applying);
        self.adapter.set_master_enabled(true);
        for (display_id, record) in reconciliation.mapping.iter() {
            if reconciliation.restored.contains(display_id) {
                self.adapter.apply_record(display_id, record);
            } else {
                // 后端启动时默认关闭，只需确认关闭状态
                self.adapter
                    .apply(display_id, &SettingChange::Enabled(false));
            }
        }

        info!(
            "✅ Bootstrap finished: {} restored, {} default",
            reconciliation.restored.len(),
            reconciliation.mapping.len() - reconciliation.restored.len()
        );
        self.transition(BootstrapState::Ready);

        Ok(reconciliation.mapping)
    }

    async fn wait_for_backend(&mut self) {
        match &mut self.warm_up {
            WarmUp::Delay(delay) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
            }
            WarmUp::ReadySignal(ready) => {
                if ready.wait_for(|ready| *ready).await.is_err() {
                    warn!("backend ready signal dropped, continuing bootstrap");
                }
            }
        }
    }

    async fn load_persisted(&self) -> Option<Value> {
        match self.persistence.get_setting(&self.settings_key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "Failed to load {}: {}, using defaults",
                    self.settings_key, err
                );
                None
            }
        }
    }

    fn transition(&self, state: BootstrapState) {
        log::debug!("bootstrap -> {:?}", state);
        self.state_sender.send_replace(state);
    }
}

/// Every enumerated display gets exactly one record: the persisted one if it
/// is readable, the default otherwise. Persisted displays that are not
/// enumerated are left out.
pub fn reconcile(displays: &[DisplayId], persisted: Option<&Value>) -> Reconciliation {
    let persisted = match persisted {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(other) => {
            warn!("persisted settings are not an object, ignoring: {}", other);
            None
        }
    };

    let mut reconciliation = Reconciliation::default();
    for display_id in displays {
        let saved = persisted
            .and_then(|map| map.get(display_id))
            .and_then(|value| {
                match serde_json::from_value::<SettingsRecord>(value.clone()) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        warn!("ignoring unreadable settings for {}: {}", display_id, err);
                        None
                    }
                }
            });

        match saved {
            Some(record) => {
                reconciliation.restored.insert(display_id.clone());
                reconciliation.mapping.insert(display_id.clone(), record);
            }
            None => {
                reconciliation
                    .mapping
                    .insert(display_id.clone(), SettingsRecord::default());
            }
        }
    }

    reconciliation
}
