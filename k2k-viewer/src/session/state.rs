//! State shared between the session handle and its polling task

use crate::render::{RenderOptions, ViewMode};
use k2k_common::events::SessionPhase;
use k2k_common::model::ClientList;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::sync::{Notify, RwLock};

/// Host-written view settings, snapshotted by the loop per result
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub clients: Option<ClientList>,
    pub selected: Option<String>,
    pub options: RenderOptions,
}

/// Shared session state
///
/// The loop phase never holds `Paused`; pause is a separate flag that
/// overlays `Calibrating` or `Tracking` in [`SessionShared::phase`].
pub struct SessionShared {
    loop_phase: AtomicU8,
    paused: AtomicBool,
    /// Wakes a paused loop on resume
    pub resume: Notify,
    pub view: RwLock<ViewState>,
}

impl SessionShared {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            loop_phase: AtomicU8::new(phase_to_u8(SessionPhase::Idle)),
            paused: AtomicBool::new(false),
            resume: Notify::new(),
            view: RwLock::new(ViewState {
                options,
                ..Default::default()
            }),
        }
    }

    pub fn loop_phase(&self) -> SessionPhase {
        phase_from_u8(self.loop_phase.load(Ordering::Acquire))
    }

    /// Externally visible phase
    pub fn phase(&self) -> SessionPhase {
        self.visible(self.loop_phase())
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Move the loop to `new`
    ///
    /// Returns the visible `(old, new)` pair when the host would see a change.
    pub fn transition(&self, new: SessionPhase) -> Option<(SessionPhase, SessionPhase)> {
        let old = phase_from_u8(self.loop_phase.swap(phase_to_u8(new), Ordering::AcqRel));
        let (old, new) = (self.visible(old), self.visible(new));
        (old != new).then_some((old, new))
    }

    /// Raise the pause flag; `true` if it was not already raised
    pub fn set_paused(&self) -> bool {
        !self.paused.swap(true, Ordering::AcqRel)
    }

    /// Clear the pause flag and wake the loop; `true` if it was raised
    pub fn clear_paused(&self) -> bool {
        let was_paused = self.paused.swap(false, Ordering::AcqRel);
        if was_paused {
            self.resume.notify_one();
        }
        was_paused
    }

    pub async fn set_view_mode(&self, mode: ViewMode) {
        self.view.write().await.options.view_mode = mode;
    }

    /// Selected view and render options, copied out of the lock
    pub async fn render_snapshot(&self) -> (Option<String>, RenderOptions) {
        let view = self.view.read().await;
        (view.selected.clone(), view.options)
    }

    fn visible(&self, phase: SessionPhase) -> SessionPhase {
        if self.is_paused() && phase.is_polling() {
            SessionPhase::Paused
        } else {
            phase
        }
    }
}

fn phase_to_u8(phase: SessionPhase) -> u8 {
    match phase {
        SessionPhase::Idle => 0,
        SessionPhase::Starting => 1,
        SessionPhase::Calibrating => 2,
        SessionPhase::Tracking => 3,
        SessionPhase::Paused => 4,
        SessionPhase::Stopping => 5,
    }
}

fn phase_from_u8(value: u8) -> SessionPhase {
    match value {
        1 => SessionPhase::Starting,
        2 => SessionPhase::Calibrating,
        3 => SessionPhase::Tracking,
        4 => SessionPhase::Paused,
        5 => SessionPhase::Stopping,
        _ => SessionPhase::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_overlays_loop_phase() {
        let shared = SessionShared::new(RenderOptions::default());
        shared.transition(SessionPhase::Tracking);

        assert!(shared.set_paused());
        assert!(!shared.set_paused());
        assert_eq!(shared.phase(), SessionPhase::Paused);
        assert_eq!(shared.loop_phase(), SessionPhase::Tracking);

        assert!(shared.clear_paused());
        assert_eq!(shared.phase(), SessionPhase::Tracking);
    }

    #[test]
    fn test_pause_does_not_overlay_idle() {
        let shared = SessionShared::new(RenderOptions::default());
        shared.set_paused();
        assert_eq!(shared.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_transition_reports_visible_change() {
        let shared = SessionShared::new(RenderOptions::default());
        assert_eq!(
            shared.transition(SessionPhase::Starting),
            Some((SessionPhase::Idle, SessionPhase::Starting))
        );
        assert_eq!(shared.transition(SessionPhase::Starting), None);

        shared.transition(SessionPhase::Calibrating);
        shared.set_paused();
        // Paused before and after: nothing for the host to see
        assert_eq!(shared.transition(SessionPhase::Tracking), None);
    }

    #[test]
    fn test_phase_encoding_round_trips() {
        for phase in [
            SessionPhase::Idle,
            SessionPhase::Starting,
            SessionPhase::Calibrating,
            SessionPhase::Tracking,
            SessionPhase::Paused,
            SessionPhase::Stopping,
        ] {
            assert_eq!(phase_from_u8(phase_to_u8(phase)), phase);
        }
    }
}
