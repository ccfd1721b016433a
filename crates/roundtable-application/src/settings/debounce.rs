//! Debounced write-back of session settings.

use roundtable_core::session::SessionGateway;
use roundtable_core::settings::SessionSettings;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type PendingSlot = Arc<Mutex<Option<SessionSettings>>>;

/// Coalesces settings edits into a single patch call per quiet window.
///
/// Each [`schedule`](Self::schedule) replaces the pending value and restarts
/// the timer, so only the last edit in a burst is written. A failed write is
/// logged and dropped. Dropping the writer cancels any pending write.
pub struct DebouncedSettingsWriter {
    gateway: Arc<dyn SessionGateway>,
    session_id: String,
    window: Duration,
    pending: PendingSlot,
    /// Cancelled on shutdown; every timer holds a child of it
    shutdown: CancellationToken,
    timer: Option<(CancellationToken, JoinHandle<()>)>,
}

impl DebouncedSettingsWriter {
    pub fn new(
        gateway: Arc<dyn SessionGateway>,
        session_id: impl Into<String>,
        window: Duration,
    ) -> Self {
        Self {
            gateway,
            session_id: session_id.into(),
            window,
            pending: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
            timer: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true while an edit is waiting to be written.
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).is_some()
    }

    /// Queues `settings` for writing once the window elapses without
    /// another edit. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, settings: SessionSettings) {
        if self.shutdown.is_cancelled() {
            tracing::debug!(
                "[DebouncedSettingsWriter] Ignoring edit for {} after shutdown",
                self.session_id
            );
            return;
        }

        *lock(&self.pending) = Some(settings);
        self.cancel_timer();

        let token = self.shutdown.child_token();
        let handle = tokio::spawn(write_after_quiet_window(
            self.gateway.clone(),
            self.session_id.clone(),
            self.pending.clone(),
            self.window,
            token.clone(),
        ));
        self.timer = Some((token, handle));
    }

    /// Writes the pending edit immediately, if any.
    pub async fn flush(&mut self) {
        self.cancel_timer();
        let pending = lock(&self.pending).take();
        if let Some(settings) = pending {
            write_settings(self.gateway.as_ref(), &self.session_id, &settings).await;
        }
    }

    /// Cancels the pending write. Later edits are ignored.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.cancel_timer();
        if lock(&self.pending).take().is_some() {
            tracing::debug!(
                "[DebouncedSettingsWriter] Discarded pending settings of {}",
                self.session_id
            );
        }
    }

    fn cancel_timer(&mut self) {
        if let Some((token, _handle)) = self.timer.take() {
            // A timer past its sleep has already taken the value; let that
            // write finish instead of aborting it mid-request.
            token.cancel();
        }
    }
}

impl Drop for DebouncedSettingsWriter {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn write_after_quiet_window(
    gateway: Arc<dyn SessionGateway>,
    session_id: String,
    pending: PendingSlot,
    window: Duration,
    token: CancellationToken,
) {
    tokio::select! {
        _ = token.cancelled() => return,
        _ = tokio::time::sleep(window) => {}
    }

    let settings = lock(&pending).take();
    if let Some(settings) = settings {
        write_settings(gateway.as_ref(), &session_id, &settings).await;
    }
}

async fn write_settings(gateway: &dyn SessionGateway, session_id: &str, settings: &SessionSettings) {
    match gateway.patch_settings(session_id, settings).await {
        Ok(()) => tracing::debug!(
            "[DebouncedSettingsWriter] Persisted settings of session {}",
            session_id
        ),
        Err(e) => tracing::warn!(
            "[DebouncedSettingsWriter] Failed to persist settings of session {}: {}",
            session_id,
            e
        ),
    }
}

fn lock(slot: &PendingSlot) -> std::sync::MutexGuard<'_, Option<SessionSettings>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use roundtable_core::error::{Result, RoundtableError};
    use roundtable_core::session::{CreateSessionRequest, Session};

    #[derive(Default)]
    struct RecordingGateway {
        patches: Mutex<Vec<(String, SessionSettings)>>,
        fail: bool,
    }

    #[async_trait]
    impl SessionGateway for RecordingGateway {
        async fn create(&self, _request: &CreateSessionRequest) -> Result<Session> {
            Err(RoundtableError::internal("unused"))
        }

        async fn list(&self) -> Result<Vec<Session>> {
            Ok(Vec::new())
        }

        async fn get(&self, _session_id: &str) -> Result<Option<Session>> {
            Ok(None)
        }

        async fn end(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }

        async fn patch_settings(&self, session_id: &str, settings: &SessionSettings) -> Result<()> {
            self.patches
                .lock()
                .unwrap()
                .push((session_id.to_string(), settings.clone()));
            if self.fail {
                return Err(RoundtableError::transport("offline"));
            }
            Ok(())
        }
    }

    fn with_temperature(temperature: f32) -> SessionSettings {
        let mut settings = SessionSettings::default();
        settings.model.temperature = temperature;
        settings
    }

    fn writer(gateway: &Arc<RecordingGateway>) -> DebouncedSettingsWriter {
        DebouncedSettingsWriter::new(gateway.clone(), "s1", Duration::from_millis(600))
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_within_window_coalesce() {
        let gateway = Arc::new(RecordingGateway::default());
        let mut writer = writer(&gateway);

        writer.schedule(with_temperature(0.1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        writer.schedule(with_temperature(0.2));
        tokio::time::sleep(Duration::from_millis(500)).await;
        writer.schedule(with_temperature(0.3));
        assert!(gateway.patches.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(700)).await;

        let patches = gateway.patches.lock().unwrap().clone();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].0, "s1");
        assert_eq!(patches[0].1.model.temperature, 0.3);
        assert!(!writer.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_windows_write_twice() {
        let gateway = Arc::new(RecordingGateway::default());
        let mut writer = writer(&gateway);

        writer.schedule(with_temperature(0.1));
        tokio::time::sleep(Duration::from_millis(700)).await;
        writer.schedule(with_temperature(0.2));
        tokio::time::sleep(Duration::from_millis(700)).await;

        assert_eq!(gateway.patches.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_write() {
        let gateway = Arc::new(RecordingGateway::default());
        let mut writer = writer(&gateway);

        writer.schedule(with_temperature(0.4));
        tokio::time::sleep(Duration::from_millis(300)).await;
        writer.shutdown();
        writer.schedule(with_temperature(0.5));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(gateway.patches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_write() {
        let gateway = Arc::new(RecordingGateway::default());
        {
            let mut writer = writer(&gateway);
            writer.schedule(with_temperature(0.4));
        }
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(gateway.patches.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let gateway = Arc::new(RecordingGateway::default());
        let mut writer = writer(&gateway);

        writer.schedule(with_temperature(0.6));
        writer.flush().await;
        assert_eq!(gateway.patches.lock().unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(gateway.patches.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_is_not_retried() {
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..Default::default()
        });
        let mut writer = writer(&gateway);

        writer.schedule(with_temperature(0.6));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(gateway.patches.lock().unwrap().len(), 1);
        assert!(!writer.has_pending());
    }
}
