
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    backend::{BackendCommand, ChannelBackend, DisplayEnumerator},
    engine::SettingsSyncEngine,
    engine_config::EngineConfig,
    persistence::SettingsPersistence,
    ring_light::DisplayId,
};

/// 模拟显示器枚举：记录调用次数，可模拟失败
pub(crate) struct FakeEnumerator {
    displays: Vec<DisplayId>,
    fail: bool,
    calls: AtomicUsize,
    called_at: std::sync::Mutex<Option<tokio::time::Instant>>,
}

impl FakeEnumerator {
    pub(crate) fn new(displays: &[&str]) -> Self {
        Self {
            displays: displays.iter().map(|name| name.to_string()).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            called_at: std::sync::Mutex::new(None),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn called_at(&self) -> Option<tokio::time::Instant> {
        *self.called_at.lock().unwrap()
    }
}

impl DisplayEnumerator for FakeEnumerator {
    fn enumerate_displays(&self) -> BoxFuture<'_, anyhow::Result<Vec<DisplayId>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.called_at.lock().unwrap() = Some(tokio::time::Instant::now());
            if self.fail {
                anyhow::bail!("backend not reachable");
            }
            Ok(self.displays.clone())
        })
    }
}

/// 读取总是失败的持久化存储
pub(crate) struct BrokenPersistence;

impl SettingsPersistence for BrokenPersistence {
    fn get_setting<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
        Box::pin(async { anyhow::bail!("storage unavailable") })
    }

    fn set_setting<'a>(&'a self, _key: &'a str, _value: Value) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async { anyhow::bail!("storage unavailable") })
    }
}

pub(crate) fn test_config() -> EngineConfig {
    EngineConfig {
        warm_up_delay_ms: 0,
        ..Default::default()
    }
}

pub(crate) fn build_engine(
    config: &EngineConfig,
    enumerator: Arc<dyn DisplayEnumerator>,
    persistence: Arc<dyn SettingsPersistence>,
) -> (SettingsSyncEngine, UnboundedReceiver<BackendCommand>) {
    let (backend, rx) = ChannelBackend::new();
    let engine = SettingsSyncEngine::new(config, enumerator, persistence, Arc::new(backend));
    (engine, rx)
}

pub(crate) fn drain(rx: &mut UnboundedReceiver<BackendCommand>) -> Vec<BackendCommand> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
