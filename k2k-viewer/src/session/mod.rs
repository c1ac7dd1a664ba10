//! Tracking session controller
//!
//! # State Progression
//! Idle → Starting → Calibrating → Tracking ⇄ Paused → Stopping → Idle
//!
//! # Architecture
//! `TrackingSession` is the handle the host shell drives. `start` spawns one
//! tokio task per run ([`runner::SessionRunner`]); each loop phase lives in
//! its own `phase_*` module:
//!
//! - **Calibrating**: poll calibration status until `Finished`
//! - **Tracking**: poll results, render the selected view, emit frames
//!
//! Stop cancels the run's `CancellationToken`. The loop observes it before
//! every request and races it against in-flight polls, then closes the
//! server session exactly once.

mod phase_calibration;
mod phase_tracking;
mod runner;
mod state;

use crate::protocol::TrackerClient;
use crate::render::{CoordinateMapper, PinholeMapper, RenderOptions, ViewMode};
use k2k_common::config::TomlConfig;
use k2k_common::events::{EventSink, SessionPhase, TrackerEvent};
use k2k_common::model::ClientList;
use k2k_common::{Error, Result};
use runner::SessionRunner;
use state::SessionShared;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polling and rendering settings for a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Delay between calibration polls, also the back-off after a failed poll
    pub calibration_delay: Duration,
    /// Delay between tracking polls; zero yields to the runtime instead
    pub tracking_interval: Duration,
    pub max_consecutive_failures: Option<u32>,
    pub calibration_timeout: Option<Duration>,
    pub tracking_timeout: Option<Duration>,
    /// Initial render options
    pub render: RenderOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

impl SessionConfig {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            calibration_delay: config.polling.calibration_delay(),
            tracking_interval: config.polling.tracking_interval(),
            max_consecutive_failures: config.polling.max_consecutive_failures,
            calibration_timeout: config.polling.calibration_timeout(),
            tracking_timeout: config.polling.tracking_timeout(),
            render: config.render,
        }
    }
}

/// Cancellation token and task of the current run
struct ActiveRun {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Host-facing session handle
pub struct TrackingSession<C: TrackerClient + 'static> {
    client: Arc<C>,
    config: SessionConfig,
    shared: Arc<SessionShared>,
    events: EventSink,
    mapper: Arc<dyn CoordinateMapper>,
    run: Mutex<Option<ActiveRun>>,
}

impl<C: TrackerClient + 'static> TrackingSession<C> {
    /// Create an idle session around a protocol client
    ///
    /// Rendering uses [`PinholeMapper`] until [`with_mapper`](Self::with_mapper)
    /// supplies the sensor's own mapper.
    pub fn new(client: C, config: SessionConfig, events: EventSink) -> Self {
        let shared = Arc::new(SessionShared::new(config.render));
        Self {
            client: Arc::new(client),
            config,
            shared,
            events,
            mapper: Arc::new(PinholeMapper::default()),
            run: Mutex::new(None),
        }
    }

    pub fn with_mapper(mut self, mapper: Arc<dyn CoordinateMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn phase(&self) -> SessionPhase {
        self.shared.phase()
    }

    /// Load camera clients from a setup file
    ///
    /// Only allowed while idle. The first client becomes the selected view.
    pub async fn load_setup(&self, path: &Path) -> Result<ClientList> {
        self.require_idle("load a setup")?;

        let clients = match self.client.load_setup(path).await {
            Ok(clients) => clients,
            Err(e) => {
                warn!(setup = %path.display(), error = %e, "Setup load failed");
                self.emit_status(format!("Setup could not be loaded: {}", e))
                    .await;
                return Err(e);
            }
        };

        {
            let mut view = self.shared.view.write().await;
            view.selected = clients.first().map(|c| c.name.clone());
            view.clients = Some(clients.clone());
        }

        self.emit_status(format!(
            "Loaded {} client(s) from {}",
            clients.len(),
            path.display()
        ))
        .await;
        Ok(clients)
    }

    /// Start a named session
    ///
    /// Returns once the run is spawned; progress arrives as events.
    pub async fn start(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("session name must not be empty".to_string()));
        }

        let mut run = self.run.lock().await;
        let run_done = run.as_ref().is_some_and(|active| {
            active.task.is_finished() || self.shared.loop_phase() == SessionPhase::Idle
        });
        if run_done {
            if let Some(active) = run.take() {
                if let Err(e) = active.task.await {
                    warn!(error = %e, "Previous session task ended abnormally");
                    self.reset_to_idle().await;
                }
            }
        }
        if run.is_some() || self.shared.loop_phase() != SessionPhase::Idle {
            return Err(Error::InvalidState(format!(
                "cannot start a session while {}",
                self.phase()
            )));
        }

        self.shared.clear_paused();
        if let Some((old, new)) = self.shared.transition(SessionPhase::Starting) {
            self.emit(TrackerEvent::phase_changed(old, new)).await;
        }
        info!(session = %name, "Starting session");

        let cancel = CancellationToken::new();
        let runner = SessionRunner::new(
            Arc::clone(&self.client),
            self.config.clone(),
            Arc::clone(&self.shared),
            self.events.clone(),
            Arc::clone(&self.mapper),
            cancel.clone(),
            name.to_string(),
        );
        let task = tokio::spawn(runner.run());

        *run = Some(ActiveRun { cancel, task });
        Ok(())
    }

    /// Suspend polling; no-op unless calibrating or tracking
    pub fn pause(&self) {
        let phase = self.shared.loop_phase();
        if !phase.is_polling() {
            debug!(phase = ?phase, "Pause ignored");
            return;
        }
        if self.shared.set_paused() {
            info!("Polling paused");
            self.events
                .emit_lossy(TrackerEvent::phase_changed(phase, SessionPhase::Paused));
        }
    }

    /// Resume polling; no-op unless paused
    pub fn resume(&self) {
        if self.shared.clear_paused() {
            let phase = self.shared.loop_phase();
            info!("Polling resumed");
            if phase.is_polling() {
                self.events
                    .emit_lossy(TrackerEvent::phase_changed(SessionPhase::Paused, phase));
            }
        }
    }

    /// Stop the current run and wait for it to close the server session
    ///
    /// Idempotent; a no-op while idle. The run stays in its slot until the
    /// task has finished, so a caller that gives up waiting leaves the close
    /// to the next `stop` or [`shutdown`](Self::shutdown).
    pub async fn stop(&self) {
        let mut run = self.run.lock().await;
        let Some(active) = run.as_mut() else {
            debug!("Stop ignored, no active session");
            return;
        };

        info!("Stopping session");
        active.cancel.cancel();

        let joined = (&mut active.task).await;
        *run = None;
        if let Err(e) = joined {
            warn!(error = %e, "Session task ended abnormally");
            self.reset_to_idle().await;
        }
    }

    /// Stop and wait; called before the host tears down
    pub async fn shutdown(&self) {
        self.stop().await;
        debug!("Session controller shut down");
    }

    /// Show a different perspective from the next result on
    pub async fn select_view(&self, name: &str) -> Result<()> {
        let mut view = self.shared.view.write().await;
        if let Some(clients) = &view.clients {
            if !clients.contains(name) {
                return Err(Error::UnknownView(name.to_string()));
            }
        }
        view.selected = Some(name.to_string());
        debug!(view = %name, "View selected");
        Ok(())
    }

    pub async fn selected_view(&self) -> Option<String> {
        self.shared.view.read().await.selected.clone()
    }

    pub async fn select_render_mode(&self, mode: ViewMode) {
        self.shared.set_view_mode(mode).await;
        debug!(mode = ?mode, "Render mode selected");
    }

    pub async fn set_render_options(&self, options: RenderOptions) {
        self.shared.view.write().await.options = options;
    }

    pub async fn render_options(&self) -> RenderOptions {
        self.shared.view.read().await.options
    }

    pub async fn clients(&self) -> Option<ClientList> {
        self.shared.view.read().await.clients.clone()
    }

    /// Recover from a run that died before reaching Idle
    async fn reset_to_idle(&self) {
        self.shared.clear_paused();
        if let Some((old, new)) = self.shared.transition(SessionPhase::Idle) {
            self.emit(TrackerEvent::phase_changed(old, new)).await;
        }
    }

    fn require_idle(&self, action: &str) -> Result<()> {
        let phase = self.phase();
        if phase != SessionPhase::Idle {
            return Err(Error::InvalidState(format!(
                "cannot {} while {}",
                action, phase
            )));
        }
        Ok(())
    }

    async fn emit(&self, event: TrackerEvent) {
        self.events.emit(event).await;
    }

    async fn emit_status(&self, message: String) {
        self.emit(TrackerEvent::status(message)).await;
    }
}

impl<C: TrackerClient + 'static> Drop for TrackingSession<C> {
    fn drop(&mut self) {
        if let Some(active) = self.run.get_mut().as_ref() {
            active.cancel.cancel();
        }
    }
}
