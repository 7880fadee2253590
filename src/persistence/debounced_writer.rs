use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use paris::error;
use tokio_util::sync::CancellationToken;

use crate::ring_light::SettingsMapping;

use super::SettingsPersistence;

/// Coalesces bursts of settings changes into one write after a quiet interval.
pub struct DebouncedWriter {
    persistence: Arc<dyn SettingsPersistence>,
    key: String,
    quiet_interval: Duration,
    pending: Mutex<Option<CancellationToken>>,
    // fired writes run one at a time, in firing order
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl DebouncedWriter {
    pub fn new(
        persistence: Arc<dyn SettingsPersistence>,
        key: impl Into<String>,
        quiet_interval: Duration,
    ) -> Self {
        Self {
            persistence,
            key: key.into(),
            quiet_interval,
            pending: Mutex::new(None),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Cancel the pending write, if any, and arm a new one for `payload`.
    ///
    /// Once the quiet interval has elapsed the write runs to completion;
    /// only a write that is still waiting can be cancelled.
    pub fn schedule(&self, payload: SettingsMapping) -> CancellationToken {
        let token = CancellationToken::new();

        let mut pending = self.lock_pending();
        if let Some(previous) = pending.replace(token.clone()) {
            previous.cancel();
        }
        drop(pending);

        let persistence = self.persistence.clone();
        let key = self.key.clone();
        let quiet_interval = self.quiet_interval;
        let cancelled = token.clone();
        let write_lock = self.write_lock.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => return,
                _ = tokio::time::sleep(quiet_interval) => {}
            }
            // fired, from here on the write can no longer be cancelled
            cancelled.cancel();

            let value = match payload.to_value() {
                Ok(value) => value,
                Err(err) => {
                    error!("failed to encode {}: {}", key, err);
                    return;
                }
            };

            let _writing = write_lock.lock().await;
            match persistence.set_setting(&key, value).await {
                Ok(()) => log::debug!("{} persisted ({} displays)", key, payload.len()),
                Err(err) => error!("failed to persist {}: {}", key, err),
            }
        });

        token
    }

    /// Whether a write is armed and has not fired or been cancelled yet.
    pub fn has_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .map(|token| !token.is_cancelled())
            .unwrap_or(false)
    }

    /// Drop the pending write without performing it.
    pub fn cancel(&self) {
        if let Some(token) = self.lock_pending().take() {
            if !token.is_cancelled() {
                log::info!("cancel pending {} write", self.key);
            }
            token.cancel();
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring_light::{SettingChange, SettingsRecord};
    use futures::future::BoxFuture;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Instant};

    #[derive(Default)]
    struct RecordingPersistence {
        writes: Mutex<Vec<(Instant, String, Value)>>,
        fail: bool,
    }

    impl RecordingPersistence {
        fn writes(&self) -> Vec<(Instant, String, Value)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl SettingsPersistence for RecordingPersistence {
        fn get_setting<'a>(
            &'a self,
            _key: &'a str,
        ) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
            Box::pin(async { Ok(None) })
        }

        fn set_setting<'a>(
            &'a self,
            key: &'a str,
            value: Value,
        ) -> BoxFuture<'a, anyhow::Result<()>> {
            Box::pin(async move {
                self.writes
                    .lock()
                    .unwrap()
                    .push((Instant::now(), key.to_string(), value));
                if self.fail {
                    anyhow::bail!("disk full");
                }
                Ok(())
            })
        }
    }

    /// The first write takes longer than the quiet interval.
    #[derive(Default)]
    struct SlowFirstWrite {
        calls: AtomicUsize,
        stored: Mutex<Option<Value>>,
    }

    impl SettingsPersistence for SlowFirstWrite {
        fn get_setting<'a>(
            &'a self,
            _key: &'a str,
        ) -> BoxFuture<'a, anyhow::Result<Option<Value>>> {
            Box::pin(async move { Ok(self.stored.lock().unwrap().clone()) })
        }

        fn set_setting<'a>(
            &'a self,
            _key: &'a str,
            value: Value,
        ) -> BoxFuture<'a, anyhow::Result<()>> {
            Box::pin(async move {
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    sleep(Duration::from_secs(2)).await;
                }
                *self.stored.lock().unwrap() = Some(value);
                Ok(())
            })
        }
    }

    fn payload(brightness: i32) -> SettingsMapping {
        SettingsMapping::new().with_change("DP-1", &SettingChange::Brightness(brightness))
    }

    fn writer(persistence: Arc<RecordingPersistence>) -> DebouncedWriter {
        DebouncedWriter::new(persistence, "monitorSettings", Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_coalesced_into_last_payload() {
        let persistence = Arc::new(RecordingPersistence::default());
        let writer = writer(persistence.clone());
        let start = Instant::now();

        for brightness in [10, 20, 30, 40] {
            writer.schedule(payload(brightness));
            sleep(Duration::from_millis(100)).await;
        }
        // the last schedule happened at t=300ms
        sleep(Duration::from_millis(1000)).await;

        let writes = persistence.writes();
        assert_eq!(writes.len(), 1);

        let (at, key, value) = &writes[0];
        let elapsed = at.duration_since(start);
        assert!(
            elapsed >= Duration::from_millis(800) && elapsed < Duration::from_millis(810),
            "written at {:?}",
            elapsed
        );
        assert_eq!(key, "monitorSettings");
        let written: SettingsMapping = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(written.get("DP-1").map(|r| r.brightness), Some(40));
        assert!(!writer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_quiet_interval_prevents_write() {
        let persistence = Arc::new(RecordingPersistence::default());
        let writer = writer(persistence.clone());

        writer.schedule(payload(10));
        assert!(writer.has_pending());
        writer.cancel();
        assert!(!writer.has_pending());

        sleep(Duration::from_secs(2)).await;
        assert!(persistence.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_write() {
        let persistence = Arc::new(RecordingPersistence::default());
        let writer = writer(persistence.clone());

        writer.schedule(payload(10));
        drop(writer);

        sleep(Duration::from_secs(2)).await;
        assert!(persistence.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_does_not_block_scheduling() {
        let persistence = Arc::new(RecordingPersistence {
            fail: true,
            ..Default::default()
        });
        let writer = writer(persistence.clone());

        writer.schedule(payload(10));
        sleep(Duration::from_millis(600)).await;
        assert_eq!(persistence.writes().len(), 1);

        writer.schedule(payload(20));
        sleep(Duration::from_millis(600)).await;

        let writes = persistence.writes();
        assert_eq!(writes.len(), 2);
        let written: SettingsMapping = serde_json::from_value(writes[1].2.clone()).unwrap();
        assert_eq!(
            written.get("DP-1"),
            Some(&SettingsRecord {
                brightness: 20,
                ..Default::default()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_separated_by_quiet_interval_are_not_coalesced() {
        let persistence = Arc::new(RecordingPersistence::default());
        let writer = writer(persistence.clone());

        writer.schedule(payload(10));
        sleep(Duration::from_millis(700)).await;
        writer.schedule(payload(20));
        sleep(Duration::from_millis(700)).await;

        assert_eq!(persistence.writes().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_write_does_not_overtake_newer_one() {
        let persistence = Arc::new(SlowFirstWrite::default());
        let writer = DebouncedWriter::new(
            persistence.clone(),
            "monitorSettings",
            Duration::from_millis(500),
        );

        writer.schedule(payload(10));
        sleep(Duration::from_millis(600)).await;
        // the first write is still running
        writer.schedule(payload(20));
        sleep(Duration::from_secs(3)).await;

        assert_eq!(persistence.calls.load(Ordering::SeqCst), 2);
        let stored = persistence.get_setting("monitorSettings").await.unwrap().unwrap();
        let written: SettingsMapping = serde_json::from_value(stored).unwrap();
        assert_eq!(written.get("DP-1").map(|r| r.brightness), Some(20));
    }
}
