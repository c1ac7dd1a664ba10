//! Test Helper Utilities
//!
//! A scripted `TrackerClient` and an event recorder shared by the session
//! tests.

#![allow(dead_code)]

use async_trait::async_trait;
use k2k_common::events::{EventSink, RenderFrame, SessionPhase, TrackerEvent};
use k2k_common::model::{
    CalibrationStatus, CameraSpacePoint, ClientDescriptor, ClientList, Joint, JointType, Person,
    Perspective, Skeleton, TrackingResult, TrackingState,
};
use k2k_common::{Error, Result};
use k2k_viewer::{SessionConfig, SimpleResponse, TrackerClient, TrackingPoll, TrackingSession};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Upper bound for any wait in the tests
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// One scripted answer
#[derive(Debug, Clone)]
pub enum Step<T> {
    Reply(T),
    /// Fails with `Error::Transport(message)`
    Fail(String),
}

impl<T> Step<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Step::Reply(value) => Ok(value),
            Step::Fail(message) => Err(Error::Transport(message)),
        }
    }
}

/// Call counters for every protocol operation
#[derive(Debug, Default)]
pub struct CallCounts {
    pub load_setup: AtomicUsize,
    pub start_session: AtomicUsize,
    pub stop_session: AtomicUsize,
    pub start_calibration: AtomicUsize,
    pub calibration_polls: AtomicUsize,
    pub start_tracking: AtomicUsize,
    pub tracking_polls: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// `TrackerClient` that answers from queues
///
/// When a queue runs dry the matching fallback answer repeats forever.
pub struct ScriptedClient {
    pub calls: CallCounts,
    pub session_names: Mutex<Vec<String>>,
    clients: ClientList,
    reachable: bool,
    start_session_reply: SimpleResponse,
    start_calibration_reply: SimpleResponse,
    start_tracking_reply: SimpleResponse,
    calibration: Mutex<VecDeque<Step<CalibrationStatus>>>,
    calibration_fallback: Step<CalibrationStatus>,
    tracking: Mutex<VecDeque<Step<TrackingPoll>>>,
    tracking_fallback: Step<TrackingPoll>,
    start_delay: Duration,
    calibration_poll_delay: Duration,
}

impl ScriptedClient {
    /// Calibration finishes on the first poll; tracking never has results
    pub fn new() -> Self {
        Self {
            calls: CallCounts::default(),
            session_names: Mutex::new(Vec::new()),
            clients: clients(&["CamA", "CamB"]),
            reachable: true,
            start_session_reply: SimpleResponse::ok(""),
            start_calibration_reply: SimpleResponse::ok(""),
            start_tracking_reply: SimpleResponse::ok(""),
            calibration: Mutex::new(VecDeque::new()),
            calibration_fallback: Step::Reply(CalibrationStatus::Finished),
            tracking: Mutex::new(VecDeque::new()),
            tracking_fallback: Step::Reply(TrackingPoll::NoNewResult),
            start_delay: Duration::ZERO,
            calibration_poll_delay: Duration::ZERO,
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn reject_start(mut self, message: &str) -> Self {
        self.start_session_reply = SimpleResponse::rejected(message);
        self
    }

    pub fn reject_calibration(mut self, message: &str) -> Self {
        self.start_calibration_reply = SimpleResponse::rejected(message);
        self
    }

    /// Hold every `start_session` answer back this long
    pub fn start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = delay;
        self
    }

    /// Hold every calibration poll answer back this long
    pub fn calibration_poll_delay(mut self, delay: Duration) -> Self {
        self.calibration_poll_delay = delay;
        self
    }

    pub fn with_calibration(self, steps: Vec<Step<CalibrationStatus>>) -> Self {
        self.calibration.lock().unwrap().extend(steps);
        self
    }

    pub fn calibration_fallback(mut self, step: Step<CalibrationStatus>) -> Self {
        self.calibration_fallback = step;
        self
    }

    pub fn with_tracking(self, steps: Vec<Step<TrackingPoll>>) -> Self {
        self.tracking.lock().unwrap().extend(steps);
        self
    }

    pub fn tracking_fallback(mut self, step: Step<TrackingPoll>) -> Self {
        self.tracking_fallback = step;
        self
    }

    pub fn start_session_calls(&self) -> usize {
        CallCounts::get(&self.calls.start_session)
    }

    pub fn stop_session_calls(&self) -> usize {
        CallCounts::get(&self.calls.stop_session)
    }

    pub fn start_calibration_calls(&self) -> usize {
        CallCounts::get(&self.calls.start_calibration)
    }

    pub fn calibration_polls(&self) -> usize {
        CallCounts::get(&self.calls.calibration_polls)
    }

    pub fn start_tracking_calls(&self) -> usize {
        CallCounts::get(&self.calls.start_tracking)
    }

    pub fn tracking_polls(&self) -> usize {
        CallCounts::get(&self.calls.tracking_polls)
    }
}

#[async_trait]
impl TrackerClient for ScriptedClient {
    async fn load_setup(&self, path: &Path) -> Result<ClientList> {
        self.calls.load_setup.fetch_add(1, Ordering::SeqCst);
        if !self.reachable {
            return Err(Error::Unavailable(format!(
                "no server for {}",
                path.display()
            )));
        }
        Ok(self.clients.clone())
    }

    async fn start_session(&self, name: &str) -> Result<SimpleResponse> {
        self.calls.start_session.fetch_add(1, Ordering::SeqCst);
        self.session_names.lock().unwrap().push(name.to_string());
        if !self.start_delay.is_zero() {
            tokio::time::sleep(self.start_delay).await;
        }
        if !self.reachable {
            return Err(Error::Unavailable("connection refused".to_string()));
        }
        Ok(self.start_session_reply.clone())
    }

    async fn stop_session(&self) -> Result<SimpleResponse> {
        self.calls.stop_session.fetch_add(1, Ordering::SeqCst);
        Ok(SimpleResponse::ok(""))
    }

    async fn start_calibration(&self) -> Result<SimpleResponse> {
        self.calls.start_calibration.fetch_add(1, Ordering::SeqCst);
        Ok(self.start_calibration_reply.clone())
    }

    async fn poll_calibration_status(&self) -> Result<CalibrationStatus> {
        self.calls.calibration_polls.fetch_add(1, Ordering::SeqCst);
        if !self.calibration_poll_delay.is_zero() {
            tokio::time::sleep(self.calibration_poll_delay).await;
        }
        let step = self.calibration.lock().unwrap().pop_front();
        step.unwrap_or_else(|| self.calibration_fallback.clone())
            .into_result()
    }

    async fn start_tracking(&self) -> Result<SimpleResponse> {
        self.calls.start_tracking.fetch_add(1, Ordering::SeqCst);
        Ok(self.start_tracking_reply.clone())
    }

    async fn poll_tracking_result(&self) -> Result<TrackingPoll> {
        self.calls.tracking_polls.fetch_add(1, Ordering::SeqCst);
        let step = self.tracking.lock().unwrap().pop_front();
        step.unwrap_or_else(|| self.tracking_fallback.clone())
            .into_result()
    }
}

pub fn clients(names: &[&str]) -> ClientList {
    names
        .iter()
        .map(|name| ClientDescriptor::new(*name))
        .collect::<Vec<_>>()
        .into()
}

pub fn acquiring(required: u32, remaining: u32) -> Step<CalibrationStatus> {
    Step::Reply(CalibrationStatus::AcquiringFrames {
        required,
        remaining,
        error: None,
    })
}

/// A person whose head and neck are tracked
pub fn person() -> Person {
    let tracked = |y: f32| Joint::new(CameraSpacePoint::new(0.1, y, 2.0), TrackingState::Tracked);
    Person {
        average_skeleton: Skeleton::new()
            .with_joint(JointType::Head, tracked(0.6))
            .with_joint(JointType::Neck, tracked(0.4)),
        ..Default::default()
    }
}

/// A result step with `people` persons in each named perspective
pub fn result(timestamp: u64, perspectives: &[(&str, usize)]) -> Step<TrackingPoll> {
    let mut result = TrackingResult {
        timestamp,
        ..Default::default()
    };
    for (name, people) in perspectives {
        result.perspectives.insert(
            name.to_string(),
            Perspective::new(vec![person(); *people]),
        );
    }
    Step::Reply(TrackingPoll::Result(result))
}

/// Short delays so the tests run fast
pub fn fast_config() -> SessionConfig {
    SessionConfig {
        calibration_delay: Duration::from_millis(1),
        tracking_interval: Duration::from_millis(1),
        ..Default::default()
    }
}

/// Drains a session's events into a shared list
pub struct EventLog {
    events: Arc<Mutex<Vec<TrackerEvent>>>,
    _collector: JoinHandle<()>,
}

impl EventLog {
    pub fn snapshot(&self) -> Vec<TrackerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .filter_map(|e| e.status_message().map(str::to_string))
            .collect()
    }

    pub fn frames(&self) -> Vec<RenderFrame> {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                TrackerEvent::FrameReady { frame, .. } => Some(frame),
                _ => None,
            })
            .collect()
    }

    pub fn calibration_statuses(&self) -> Vec<CalibrationStatus> {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                TrackerEvent::CalibrationProgress { status, .. } => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Phase transitions as `(old, new)` pairs
    pub fn phases(&self) -> Vec<(SessionPhase, SessionPhase)> {
        self.snapshot()
            .into_iter()
            .filter_map(|e| match e {
                TrackerEvent::PhaseChanged {
                    old_phase,
                    new_phase,
                    ..
                } => Some((old_phase, new_phase)),
                _ => None,
            })
            .collect()
    }

    pub fn has_status(&self, needle: &str) -> bool {
        self.statuses().iter().any(|s| s.contains(needle))
    }

    /// Wait until `done` holds for the recorded events
    pub async fn wait_until(&self, what: &str, done: impl Fn(&EventLog) -> bool) {
        wait_for(what, || done(self)).await;
    }

    /// Wait until the run has returned to Idle
    pub async fn wait_for_idle(&self) {
        self.wait_until("return to Idle", |log| {
            log.phases()
                .iter()
                .any(|(_, new)| *new == SessionPhase::Idle)
        })
        .await;
    }
}

/// Poll `done` every few milliseconds; panics after [`WAIT_LIMIT`]
pub async fn wait_for(what: &str, done: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
    while !done() {
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Session around `client` with its event stream recorded
pub fn session_with(
    client: ScriptedClient,
    config: SessionConfig,
) -> (TrackingSession<ScriptedClient>, EventLog) {
    let (sink, mut rx) = EventSink::channel(64);
    let events = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&events);
    let collector = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            recorded.lock().unwrap().push(event);
        }
    });

    let session = TrackingSession::new(client, config, sink);
    (
        session,
        EventLog {
            events,
            _collector: collector,
        },
    )
}
