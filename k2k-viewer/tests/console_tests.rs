//! Host shell integration tests
//!
//! Startup flags go through the same command path as typed commands, so a
//! failing flag is reported and the shell keeps running.

mod helpers;

use helpers::{fast_config, session_with, ScriptedClient};
use k2k_common::events::SessionPhase;
use k2k_viewer::console::{self, HostCommand, Outcome};
use std::path::PathBuf;

#[tokio::test]
async fn test_startup_with_unreachable_server_keeps_running() {
    let (session, log) = session_with(ScriptedClient::new().unreachable(), fast_config());

    let startup = console::startup_commands(
        Some(PathBuf::from("rig.toml")),
        Some("CamB".to_string()),
        Some("demo".to_string()),
    );
    let lines = console::apply_startup(&session, startup).await;

    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("no server for rig.toml"));
    assert_eq!(session.selected_view().await.as_deref(), Some("CamB"));

    // The start flag still ran and came back to Idle on its own
    log.wait_for_idle().await;
    assert!(log.has_status("Session not started"));
    assert_eq!(session.client().start_session_calls(), 1);
    assert_eq!(session.phase(), SessionPhase::Idle);

    // Commands typed afterwards still work
    let outcome = console::apply(&session, HostCommand::Status).await.unwrap();
    assert!(matches!(outcome, Outcome::Reply(text) if text.starts_with("Phase: Idle")));

    session.shutdown().await;
}

#[tokio::test]
async fn test_startup_reports_setup_reply() {
    let (session, _log) = session_with(ScriptedClient::new(), fast_config());

    let startup = console::startup_commands(Some(PathBuf::from("rig.toml")), None, None);
    let lines = console::apply_startup(&session, startup).await;

    assert_eq!(lines, vec!["Clients: CamA, CamB".to_string()]);
    assert_eq!(session.selected_view().await.as_deref(), Some("CamA"));
}
