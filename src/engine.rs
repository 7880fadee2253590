use std::sync::Arc;

use paris::{info, warn};
use serde_json::Value;
use tokio::sync::{watch, Mutex, RwLock};

use crate::{
    backend::{BackendControl, BackendSyncAdapter, DisplayEnumerator},
    bootstrap::{BootstrapSequencer, BootstrapState, WarmUp},
    engine_config::EngineConfig,
    persistence::{DebouncedWriter, SettingsPersistence},
    ring_light::{
        pointer_down_color, pointer_move_color, PointerPosition, RingBounds, SettingChange,
        SettingField, SettingsMapping, SettingsRecord, SettingsStore,
    },
};

/// Entry point for presentation layers: every settings change goes through here.
pub struct SettingsSyncEngine {
    store: RwLock<SettingsStore>,
    adapter: BackendSyncAdapter,
    writer: DebouncedWriter,
    bootstrapper: Mutex<Option<BootstrapSequencer>>,
    bootstrap_state: watch::Receiver<BootstrapState>,
    settings_update_sender: watch::Sender<SettingsMapping>,
}

impl SettingsSyncEngine {
    pub fn new(
        config: &EngineConfig,
        enumerator: Arc<dyn DisplayEnumerator>,
        persistence: Arc<dyn SettingsPersistence>,
        backend: Arc<dyn BackendControl>,
    ) -> Self {
        log::info!("🔧 Initializing SettingsSyncEngine...");

        let adapter = BackendSyncAdapter::new(backend);
        let writer = DebouncedWriter::new(
            persistence.clone(),
            config.settings_key.clone(),
            config.persist_debounce(),
        );
        let bootstrapper = BootstrapSequencer::new(
            enumerator,
            persistence,
            adapter.clone(),
            config.settings_key.clone(),
            WarmUp::Delay(config.warm_up_delay()),
        );
        let bootstrap_state = bootstrapper.subscribe_state();
        let (settings_update_sender, _) = watch::channel(SettingsMapping::new());

        Self {
            store: RwLock::new(SettingsStore::new(config.clamp_values)),
            adapter,
            writer,
            bootstrapper: Mutex::new(Some(bootstrapper)),
            bootstrap_state,
            settings_update_sender,
        }
    }

    /// Wait for the backend's ready signal instead of the fixed warm-up delay.
    pub fn with_ready_signal(mut self, ready: watch::Receiver<bool>) -> Self {
        if let Some(bootstrapper) = self.bootstrapper.get_mut() {
            bootstrapper.set_warm_up(WarmUp::ReadySignal(ready));
        }
        self
    }

    /// Run the bootstrap sequence and seed the store. Only the first call runs it.
    pub async fn bootstrap(&self) -> anyhow::Result<SettingsMapping> {
        let bootstrapper = self
            .bootstrapper
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow::anyhow!("bootstrap already ran"))?;

        let mapping = bootstrapper.run().await?;

        let mut store = self.store.write().await;
        store.seed(mapping.clone());
        self.settings_update_sender.send_replace(mapping.clone());
        drop(store);

        info!("settings ready for {} display(s)", mapping.len());
        Ok(mapping)
    }

    pub fn bootstrap_state(&self) -> watch::Receiver<BootstrapState> {
        self.bootstrap_state.clone()
    }

    pub async fn get(&self, display_id: &str) -> SettingsRecord {
        self.store.read().await.get(display_id)
    }

    pub async fn settings(&self) -> SettingsMapping {
        self.store.read().await.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SettingsMapping> {
        self.settings_update_sender.subscribe()
    }

    /// Apply one field change: store it, push it to the backend, then
    /// (re)schedule the debounced write of the whole mapping.
    ///
    /// Refused until the bootstrap has seeded the store, so an early edit
    /// can never overwrite the persisted settings.
    pub async fn update(
        &self,
        display_id: &str,
        change: SettingChange,
    ) -> anyhow::Result<SettingsMapping> {
        // held until the write is scheduled so payloads follow update order
        let mut store = self.store.write().await;

        if !store.is_seeded() {
            let state = self.bootstrap_state.borrow().clone();
            warn!(
                "ignoring {} change for {} while bootstrap is {:?}",
                change.field(),
                display_id,
                state
            );
            anyhow::bail!("settings are not ready (bootstrap {:?})", state);
        }

        let change = store.normalize(change);
        let mapping = store.update(display_id, &change);

        self.adapter.apply(display_id, &change);
        self.writer.schedule(mapping.clone());
        self.settings_update_sender.send_replace(mapping.clone());

        log::debug!("{} {} updated: {:?}", display_id, change.field(), change);
        Ok(mapping)
    }

    /// [`Self::update`] with the field given by name and the value as JSON.
    pub async fn update_field(
        &self,
        display_id: &str,
        field: &str,
        value: &Value,
    ) -> anyhow::Result<SettingsMapping> {
        let field: SettingField = field.parse()?;
        let change = SettingChange::from_json(field, value)?;
        self.update(display_id, change).await
    }

    /// Press on the color ring.
    pub async fn pick_color(
        &self,
        display_id: &str,
        pointer: PointerPosition,
        bounds: &RingBounds,
    ) -> anyhow::Result<SettingsMapping> {
        let color = pointer_down_color(pointer, bounds);
        self.update(display_id, SettingChange::Color(color)).await
    }

    /// Pointer moved over the color ring; only counts while the primary button is held.
    pub async fn drag_color(
        &self,
        display_id: &str,
        pointer: PointerPosition,
        bounds: &RingBounds,
        buttons: u16,
    ) -> anyhow::Result<Option<SettingsMapping>> {
        match pointer_move_color(pointer, bounds, buttons) {
            Some(color) => Ok(Some(
                self.update(display_id, SettingChange::Color(color)).await?,
            )),
            None => Ok(None),
        }
    }

    pub fn has_pending_write(&self) -> bool {
        self.writer.has_pending()
    }

    /// Teardown: the pending write, if any, is dropped.
    pub fn shutdown(&self) {
        info!("shutting down settings engine");
        self.writer.cancel();
    }
}
