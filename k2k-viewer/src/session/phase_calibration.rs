//! CALIBRATING phase
//!
//! Polls the server's calibration status until it reports `Finished`.
//! Every answer is surfaced twice: as a `CalibrationProgress` event and as
//! a status line. Answers that arrive after the host paused are dropped.

use super::runner::{PhaseExit, SessionRunner};
use crate::protocol::TrackerClient;
use k2k_common::events::TrackerEvent;
use k2k_common::Result;
use tracing::{debug, info, trace};

const LABEL: &str = "Calibration";

impl<C: TrackerClient + 'static> SessionRunner<C> {
    /// Poll until calibration finishes, the deadline passes, or the run is cancelled
    pub(super) async fn phase_calibrating(&self) -> Result<PhaseExit> {
        let deadline = Self::deadline(self.config.calibration_timeout);
        let mut failures = 0u32;

        info!(session = %self.session_name, "Calibrating");

        loop {
            self.wait_while_paused(LABEL).await?;
            self.check_cancelled()?;

            if Self::expired(deadline) {
                self.emit_status(format!(
                    "Calibration did not finish within {:?}, stopping session",
                    self.config.calibration_timeout.unwrap_or_default()
                ))
                .await;
                return Ok(PhaseExit::TimedOut);
            }

            match self.cancellable(self.client.poll_calibration_status()).await {
                Ok(status) if self.shared.is_paused() => {
                    failures = 0;
                    trace!(status = %status, "Calibration status discarded while paused");
                }
                Ok(status) => {
                    failures = 0;
                    debug!(status = %status, "Calibration status");

                    let finished = status.is_finished();
                    let message = status.to_string();
                    self.events.emit(TrackerEvent::calibration(status)).await;
                    self.emit_status(message).await;

                    if finished {
                        info!(session = %self.session_name, "Calibration finished");
                        return Ok(PhaseExit::Completed);
                    }
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => self.report_poll_failure(LABEL, e, &mut failures).await?,
            }

            self.sleep_cancellable(self.config.calibration_delay).await?;
        }
    }
}
