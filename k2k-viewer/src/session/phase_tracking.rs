//! TRACKING phase
//!
//! Polls fused results, renders the selected perspective and hands the
//! frame to the host. Runs until stopped; results that arrive while paused
//! or repeat the previous timestamp are dropped.

use super::runner::{PhaseExit, SessionRunner};
use crate::protocol::{TrackerClient, TrackingPoll};
use crate::view;
use k2k_common::events::TrackerEvent;
use k2k_common::model::TrackingResult;
use k2k_common::Result;
use tracing::{debug, info, trace};

const LABEL: &str = "Tracking";

impl<C: TrackerClient + 'static> SessionRunner<C> {
    pub(super) async fn phase_tracking(&self) -> Result<PhaseExit> {
        let deadline = Self::deadline(self.config.tracking_timeout);
        let mut failures = 0u32;
        let mut last_timestamp: Option<u64> = None;

        info!(session = %self.session_name, "Tracking");

        loop {
            self.wait_while_paused(LABEL).await?;
            self.check_cancelled()?;

            if Self::expired(deadline) {
                self.emit_status(format!(
                    "Tracking time limit of {:?} reached, stopping session",
                    self.config.tracking_timeout.unwrap_or_default()
                ))
                .await;
                return Ok(PhaseExit::TimedOut);
            }

            match self.cancellable(self.client.poll_tracking_result()).await {
                Ok(TrackingPoll::Result(result)) => {
                    failures = 0;
                    if self.shared.is_paused() {
                        trace!(timestamp = result.timestamp, "Result discarded while paused");
                    } else if last_timestamp == Some(result.timestamp) {
                        trace!(timestamp = result.timestamp, "Repeated result skipped");
                    } else {
                        last_timestamp = Some(result.timestamp);
                        self.dispatch(&result).await;
                    }
                }
                Ok(TrackingPoll::NoNewResult) => failures = 0,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    self.report_poll_failure(LABEL, e, &mut failures).await?;
                    self.sleep_cancellable(self.config.calibration_delay).await?;
                    continue;
                }
            }

            if self.config.tracking_interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                self.sleep_cancellable(self.config.tracking_interval).await?;
            }
        }
    }

    /// Render the selected view of a result and emit it
    async fn dispatch(&self, result: &TrackingResult) {
        let (selected, options) = self.shared.render_snapshot().await;

        match view::render_selected(result, selected.as_deref(), options, self.mapper.as_ref()) {
            Some(frame) => {
                trace!(
                    timestamp = frame.timestamp,
                    perspective = %frame.perspective,
                    people = frame.people.len(),
                    "Frame ready"
                );
                self.events.emit(TrackerEvent::frame(frame)).await;
            }
            None => debug!(
                timestamp = result.timestamp,
                view = ?selected,
                "Selected view not in result"
            ),
        }
    }
}
