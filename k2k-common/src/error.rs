//! Common error types for K2K

use thiserror::Error;

/// Common result type for K2K operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the protocol client and the session controller
///
/// Nothing here is fatal to the process: every variant except `Cancelled`
/// ends up as a status line for the host shell.
#[derive(Error, Debug)]
pub enum Error {
    /// Tracking server could not be reached (setup load, session start)
    #[error("Server unavailable: {0}")]
    Unavailable(String),

    /// Server answered a start request with `success = false`
    #[error("Server rejected request: {0}")]
    ServerRejected(String),

    /// Network or HTTP failure during a request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Polling loop was asked to stop
    #[error("Cancelled")]
    Cancelled,

    /// Server payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration or setup file loading/validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Command not valid in the current session phase
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid user input or command argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Perspective name not advertised by the loaded setup
    #[error("Unknown view: {0}")]
    UnknownView(String),
}

impl Error {
    /// True for the internal stop path, which is never reported to the user
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
