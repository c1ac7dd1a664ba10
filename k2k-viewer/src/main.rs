//! k2k-viewer - command-line host for the tracking viewer core
//!
//! Loads configuration, connects to the tracking server and reads host
//! commands from stdin. Events from the session are written to the log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use k2k_common::config::{resolve_config_path, TomlConfig};
use k2k_common::events::{EventReceiver, EventSink, TrackerEvent};
use k2k_viewer::console::{self, HostCommand, Outcome};
use k2k_viewer::render::{ConfidencePolicy, DisplaySpace, ViewMode};
use k2k_viewer::{Endpoint, HttpTrackerClient, SessionConfig, TrackingSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Events buffered between the session and the log writer
const EVENT_CAPACITY: usize = 256;

/// Command-line arguments for k2k-viewer
#[derive(Parser, Debug)]
#[command(name = "k2k-viewer")]
#[command(about = "Viewer for the K2K multi-camera skeletal tracking server")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/k2k/viewer.toml)
    #[arg(short, long, env = "K2K_CONFIG")]
    config: Option<PathBuf>,

    /// Tracking server address, overrides the config file
    #[arg(short, long, env = "K2K_SERVER_URL")]
    server: Option<String>,

    /// Setup file to load at startup
    #[arg(long)]
    setup: Option<PathBuf>,

    /// Start a session with this name right away (needs --setup)
    #[arg(long, requires = "setup")]
    session: Option<String>,

    /// Perspective to show
    #[arg(long)]
    view: Option<String>,

    /// Draw only the average skeleton of each person
    #[arg(long)]
    average_only: bool,

    /// Draw only fully tracked joints and bones
    #[arg(long)]
    strict: bool,

    /// Project into color space instead of depth space
    #[arg(long)]
    color_space: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let mut config = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing (RUST_LOG wins over the config file)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("k2k_viewer={0},k2k_common={0}", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting k2k-viewer {}", env!("CARGO_PKG_VERSION"));

    if let Some(server) = args.server {
        config.server.url = server;
    }
    if args.average_only {
        config.render.view_mode = ViewMode::AverageOnly;
    }
    if args.strict {
        config.render.confidence = ConfidencePolicy::Strict;
    }
    if args.color_space {
        config.render.display_space = DisplaySpace::Color;
    }

    let endpoint = Endpoint::parse(&config.server.url).context("Invalid server address")?;
    info!("Tracking server: {}", endpoint);

    let client = HttpTrackerClient::new(endpoint, config.server.request_timeout())
        .context("Failed to create HTTP client")?;

    let (events, receiver) = EventSink::channel(EVENT_CAPACITY);
    let session = TrackingSession::new(client, SessionConfig::from_config(&config), events);
    let logger = tokio::spawn(log_events(receiver));

    let startup = console::startup_commands(args.setup, args.view, args.session);
    for line in console::apply_startup(&session, startup).await {
        println!("{}", line);
    }

    println!("{}", console::HELP);

    let quit = CancellationToken::new();
    let interrupt = tokio::spawn({
        let quit = quit.clone();
        async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupted");
                    quit.cancel();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        }
    });

    let loop_result = command_loop(&session, &quit).await;
    interrupt.abort();

    session.shutdown().await;
    drop(session);
    if let Err(e) = logger.await {
        warn!("Event logger ended abnormally: {}", e);
    }

    loop_result?;
    info!("Shutdown complete");
    Ok(())
}

/// Read host commands from stdin until `quit`, end of input or Ctrl-C
///
/// `quit` is only observed between commands, so a command already running
/// (such as `stop`) completes first.
async fn command_loop(
    session: &TrackingSession<HttpTrackerClient>,
    quit: &CancellationToken,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            biased;
            _ = quit.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else { break };

        let command = match HostCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match console::apply(session, command).await {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Reply(text)) => println!("{}", text),
            Ok(Outcome::Quit) => break,
            Err(e) => println!("{}", e),
        }
    }
    Ok(())
}

/// Drain the event channel into the log
async fn log_events(mut receiver: EventReceiver) {
    while let Some(event) = receiver.recv().await {
        let line = console::describe_event(&event);
        match &event {
            TrackerEvent::FrameReady { .. } => tracing::debug!("{}", line),
            TrackerEvent::Status { message, .. } if message.contains("failed") => {
                error!("{}", line)
            }
            _ => info!("{}", line),
        }
    }
}
