//! One session run: start, calibrate, track, stop

use super::state::SessionShared;
use super::SessionConfig;
use crate::protocol::{SimpleResponse, TrackerClient};
use crate::render::CoordinateMapper;
use k2k_common::events::{EventSink, SessionPhase, TrackerEvent};
use k2k_common::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a loop phase ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PhaseExit {
    Completed,
    TimedOut,
}

/// Owns everything one run needs; consumed by [`SessionRunner::run`]
pub(super) struct SessionRunner<C> {
    pub(super) client: Arc<C>,
    pub(super) config: SessionConfig,
    pub(super) shared: Arc<SessionShared>,
    pub(super) events: EventSink,
    pub(super) mapper: Arc<dyn CoordinateMapper>,
    pub(super) cancel: CancellationToken,
    pub(super) session_name: String,
}

impl<C: TrackerClient + 'static> SessionRunner<C> {
    pub(super) fn new(
        client: Arc<C>,
        config: SessionConfig,
        shared: Arc<SessionShared>,
        events: EventSink,
        mapper: Arc<dyn CoordinateMapper>,
        cancel: CancellationToken,
        session_name: String,
    ) -> Self {
        Self {
            client,
            config,
            shared,
            events,
            mapper,
            cancel,
            session_name,
        }
    }

    /// Task body
    ///
    /// Once the server has accepted the session, every exit path goes
    /// through [`stop_remote_session`](Self::stop_remote_session).
    pub(super) async fn run(self) {
        // Not raced against cancellation: a session the server opened must be
        // known so it can be closed again.
        let started = self.client.start_session(&self.session_name).await;
        match started {
            Ok(SimpleResponse { success: true, server_message }) => {
                info!(session = %self.session_name, "Session started");
                self.emit_status(start_message("Session started", &server_message))
                    .await;
            }
            Ok(SimpleResponse { server_message, .. }) => {
                warn!(session = %self.session_name, message = %server_message, "Session rejected");
                self.emit_status(format!("Session not started. Message: {}", server_message))
                    .await;
                self.set_phase(SessionPhase::Idle).await;
                return;
            }
            Err(e) => {
                warn!(session = %self.session_name, error = %e, "Session start failed");
                self.emit_status(format!("Session not started. Message: {}", e))
                    .await;
                self.set_phase(SessionPhase::Idle).await;
                return;
            }
        }

        match self.drive().await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {
                debug!(session = %self.session_name, "Session run cancelled")
            }
            Err(e) => {
                warn!(session = %self.session_name, error = %e, "Session run aborted");
                self.emit_status(e.to_string()).await;
            }
        }

        self.stop_remote_session().await;
    }

    /// Calibration, then tracking
    async fn drive(&self) -> Result<()> {
        self.check_cancelled()?;
        let response = self.cancellable(self.client.start_calibration()).await?;
        if !response.success {
            return Err(Error::ServerRejected(format!(
                "Calibration could not begin. Message: {}",
                response.server_message
            )));
        }

        self.set_phase(SessionPhase::Calibrating).await;
        self.emit_status(start_message("Calibration started", &response.server_message))
            .await;

        if self.phase_calibrating().await? == PhaseExit::TimedOut {
            return Ok(());
        }

        self.check_cancelled()?;
        let response = self.cancellable(self.client.start_tracking()).await?;
        if !response.success {
            return Err(Error::ServerRejected(format!(
                "Tracking could not begin. Message: {}",
                response.server_message
            )));
        }

        self.set_phase(SessionPhase::Tracking).await;
        self.emit_status(start_message("Tracking started", &response.server_message))
            .await;

        self.phase_tracking().await?;
        Ok(())
    }

    /// Close the server session and return to Idle whatever the answer
    async fn stop_remote_session(&self) {
        self.set_phase(SessionPhase::Stopping).await;

        match self.client.stop_session().await {
            Ok(response) if response.success => {
                info!(session = %self.session_name, "Session stopped");
                self.emit_status(start_message("Session stopped", &response.server_message))
                    .await;
            }
            Ok(response) => {
                warn!(session = %self.session_name, message = %response.server_message, "Stop rejected");
                self.emit_status(format!(
                    "Session stop was rejected. Message: {}",
                    response.server_message
                ))
                .await;
            }
            Err(e) => {
                warn!(session = %self.session_name, error = %e, "Stop failed");
                self.emit_status(format!("Session stop failed: {}", e)).await;
            }
        }

        self.shared.clear_paused();
        self.set_phase(SessionPhase::Idle).await;
    }

    pub(super) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Race a request against cancellation
    pub(super) async fn cancellable<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = request => result,
        }
    }

    pub(super) async fn sleep_cancellable(&self, delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return self.check_cancelled();
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Block while the host has paused polling
    ///
    /// Reports the pause once per episode and the resume when it ends.
    pub(super) async fn wait_while_paused(&self, label: &str) -> Result<()> {
        if !self.shared.is_paused() {
            return Ok(());
        }

        debug!(phase = %label, "Loop paused");
        self.emit_status(format!("{} paused", label)).await;

        loop {
            let resumed = self.shared.resume.notified();
            if !self.shared.is_paused() {
                break;
            }
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Error::Cancelled),
                _ = resumed => {}
            }
        }

        self.check_cancelled()?;
        debug!(phase = %label, "Loop resumed");
        self.emit_status(format!("{} resumed", label)).await;
        Ok(())
    }

    /// Deadline for a loop phase, if one is configured
    pub(super) fn deadline(timeout: Option<Duration>) -> Option<Instant> {
        timeout.map(|t| Instant::now() + t)
    }

    pub(super) fn expired(deadline: Option<Instant>) -> bool {
        deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Report a failed poll; escalate once the failure cap is reached
    pub(super) async fn report_poll_failure(
        &self,
        label: &str,
        error: Error,
        consecutive: &mut u32,
    ) -> Result<()> {
        *consecutive += 1;
        warn!(phase = %label, error = %error, consecutive = *consecutive, "Poll failed");
        self.emit_status(format!("{} poll failed: {}", label, error))
            .await;

        match self.config.max_consecutive_failures {
            Some(max) if *consecutive >= max => Err(Error::Transport(format!(
                "{} poll failed {} times in a row, stopping session",
                label, consecutive
            ))),
            _ => Ok(()),
        }
    }

    pub(super) async fn set_phase(&self, phase: SessionPhase) {
        if let Some((old, new)) = self.shared.transition(phase) {
            debug!(session = %self.session_name, old_phase = ?old, new_phase = ?new, "Phase changed");
            self.events.emit(TrackerEvent::phase_changed(old, new)).await;
        }
    }

    pub(super) async fn emit_status(&self, message: String) {
        self.events.emit(TrackerEvent::status(message)).await;
    }
}

/// "<what>" or "<what>. Message: <server text>" when the server said something
fn start_message(what: &str, server_message: &str) -> String {
    if server_message.is_empty() {
        what.to_string()
    } else {
        format!("{}. Message: {}", what, server_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_message_includes_server_text() {
        assert_eq!(start_message("Session started", ""), "Session started");
        assert_eq!(
            start_message("Session started", "3 clients ready"),
            "Session started. Message: 3 clients ready"
        );
    }

    #[test]
    fn test_no_deadline_never_expires() {
        assert!(!SessionRunner::<crate::protocol::HttpTrackerClient>::expired(None));
        let past = SessionRunner::<crate::protocol::HttpTrackerClient>::deadline(Some(Duration::ZERO));
        assert!(SessionRunner::<crate::protocol::HttpTrackerClient>::expired(past));
    }
}
