//! Line-oriented host shell
//!
//! The binary reads commands from stdin and applies them to a
//! [`TrackingSession`]; events are written to the log.

use crate::protocol::TrackerClient;
use crate::render::{ConfidencePolicy, DisplaySpace, ViewMode};
use crate::session::TrackingSession;
use k2k_common::events::TrackerEvent;
use k2k_common::{Error, Result};
use std::path::PathBuf;
use tracing::warn;

pub const HELP: &str = "\
Commands:
  load <setup.toml>        load camera clients
  start <name>             start a session
  pause | resume           suspend or continue polling
  stop                     stop the session
  view <client>            show another perspective
  mode all|average         per-camera skeletons or average only
  confidence lenient|strict
  space depth|color
  status                   show the current phase
  help | quit";

/// A parsed host command
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Load(PathBuf),
    Start(String),
    Pause,
    Resume,
    Stop,
    View(String),
    Mode(ViewMode),
    Confidence(ConfidencePolicy),
    Space(DisplaySpace),
    Status,
    Help,
    Quit,
}

impl HostCommand {
    /// Parse one input line; `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "load" => HostCommand::Load(PathBuf::from(required(rest, "load <setup.toml>")?)),
            "start" => HostCommand::Start(required(rest, "start <name>")?.to_string()),
            "pause" => HostCommand::Pause,
            "resume" => HostCommand::Resume,
            "stop" => HostCommand::Stop,
            "view" => HostCommand::View(required(rest, "view <client>")?.to_string()),
            "mode" => HostCommand::Mode(match rest {
                "all" => ViewMode::All,
                "average" | "average_only" => ViewMode::AverageOnly,
                _ => return Err(usage("mode all|average")),
            }),
            "confidence" => HostCommand::Confidence(match rest {
                "lenient" => ConfidencePolicy::Lenient,
                "strict" => ConfidencePolicy::Strict,
                _ => return Err(usage("confidence lenient|strict")),
            }),
            "space" => HostCommand::Space(match rest {
                "depth" => DisplaySpace::Depth,
                "color" => DisplaySpace::Color,
                _ => return Err(usage("space depth|color")),
            }),
            "status" => HostCommand::Status,
            "help" | "?" => HostCommand::Help,
            "quit" | "exit" => HostCommand::Quit,
            other => {
                return Err(Error::InvalidInput(format!(
                    "unknown command '{}' (try 'help')",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

fn required<'a>(rest: &'a str, form: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(usage(form))
    } else {
        Ok(rest)
    }
}

fn usage(form: &str) -> Error {
    Error::InvalidInput(format!("usage: {}", form))
}

/// What the shell should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// Text for the user
    Reply(String),
    Quit,
}

/// Apply a command to the session
pub async fn apply<C: TrackerClient + 'static>(
    session: &TrackingSession<C>,
    command: HostCommand,
) -> Result<Outcome> {
    match command {
        HostCommand::Load(path) => {
            let clients = session.load_setup(&path).await?;
            return Ok(Outcome::Reply(format!("Clients: {}", clients.names().join(", "))));
        }
        HostCommand::Start(name) => session.start(&name).await?,
        HostCommand::Pause => session.pause(),
        HostCommand::Resume => session.resume(),
        HostCommand::Stop => session.stop().await,
        HostCommand::View(name) => session.select_view(&name).await?,
        HostCommand::Mode(mode) => session.select_render_mode(mode).await,
        HostCommand::Confidence(confidence) => {
            let mut options = session.render_options().await;
            options.confidence = confidence;
            session.set_render_options(options).await;
        }
        HostCommand::Space(display_space) => {
            let mut options = session.render_options().await;
            options.display_space = display_space;
            session.set_render_options(options).await;
        }
        HostCommand::Status => {
            let view = session.selected_view().await;
            return Ok(Outcome::Reply(format!(
                "Phase: {}, view: {}",
                session.phase(),
                view.as_deref().unwrap_or("(first available)")
            )));
        }
        HostCommand::Help => return Ok(Outcome::Reply(HELP.to_string())),
        HostCommand::Quit => return Ok(Outcome::Quit),
    }
    Ok(Outcome::Continue)
}

/// Commands equivalent to the host's startup flags, in the order they apply
pub fn startup_commands(
    setup: Option<PathBuf>,
    view: Option<String>,
    session: Option<String>,
) -> Vec<HostCommand> {
    let mut commands = Vec::new();
    commands.extend(setup.map(HostCommand::Load));
    commands.extend(view.map(HostCommand::View));
    commands.extend(session.map(HostCommand::Start));
    commands
}

/// Apply startup commands, returning the lines to show the user
///
/// A failed command is reported like one typed at the prompt and the rest
/// still run.
pub async fn apply_startup<C: TrackerClient + 'static>(
    session: &TrackingSession<C>,
    commands: Vec<HostCommand>,
) -> Vec<String> {
    let mut lines = Vec::new();
    for command in commands {
        let description = format!("{:?}", command);
        match apply(session, command).await {
            Ok(Outcome::Reply(text)) => lines.push(text),
            Ok(_) => {}
            Err(e) => {
                warn!(command = %description, error = %e, "Startup command failed");
                lines.push(e.to_string());
            }
        }
    }
    lines
}

/// One-line summary of an event for the log
pub fn describe_event(event: &TrackerEvent) -> String {
    match event {
        TrackerEvent::PhaseChanged {
            old_phase,
            new_phase,
            ..
        } => format!("{} -> {}", old_phase, new_phase),
        TrackerEvent::Status { message, .. } => message.clone(),
        TrackerEvent::CalibrationProgress { status, .. } => format!("calibration: {}", status),
        TrackerEvent::FrameReady { frame, .. } => format!(
            "frame {} [{}]: {} people, {} bones, {} joints",
            frame.timestamp,
            frame.perspective,
            frame.people.len(),
            frame.line_count(),
            frame.circle_count()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k2k_common::events::{RenderFrame, SessionPhase};

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            HostCommand::parse("start demo session").unwrap(),
            Some(HostCommand::Start("demo session".to_string()))
        );
        assert_eq!(
            HostCommand::parse("  LOAD ./rig.toml ").unwrap(),
            Some(HostCommand::Load(PathBuf::from("./rig.toml")))
        );
        assert_eq!(
            HostCommand::parse("mode average").unwrap(),
            Some(HostCommand::Mode(ViewMode::AverageOnly))
        );
        assert_eq!(
            HostCommand::parse("confidence strict").unwrap(),
            Some(HostCommand::Confidence(ConfidencePolicy::Strict))
        );
        assert_eq!(HostCommand::parse("pause").unwrap(), Some(HostCommand::Pause));
        assert_eq!(HostCommand::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            HostCommand::parse("start"),
            Err(Error::InvalidInput(msg)) if msg.contains("usage")
        ));
        assert!(matches!(
            HostCommand::parse("mode sideways"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            HostCommand::parse("calibrate"),
            Err(Error::InvalidInput(msg)) if msg.contains("unknown command")
        ));
    }

    #[test]
    fn test_startup_commands_follow_flag_order() {
        assert_eq!(
            startup_commands(
                Some(PathBuf::from("rig.toml")),
                Some("CamB".to_string()),
                Some("demo".to_string())
            ),
            vec![
                HostCommand::Load(PathBuf::from("rig.toml")),
                HostCommand::View("CamB".to_string()),
                HostCommand::Start("demo".to_string()),
            ]
        );
        assert!(startup_commands(None, None, None).is_empty());
    }

    #[test]
    fn test_describe_events() {
        let event = TrackerEvent::phase_changed(SessionPhase::Idle, SessionPhase::Starting);
        assert_eq!(describe_event(&event), "Idle -> Starting");

        let frame = RenderFrame {
            timestamp: 12,
            perspective: "kinect-left".to_string(),
            people: vec![],
        };
        assert_eq!(
            describe_event(&TrackerEvent::frame(frame)),
            "frame 12 [kinect-left]: 0 people, 0 bones, 0 joints"
        );
    }
}
