use thiserror::Error;

/// Main error type for CellAdvisor operations
#[derive(Error, Debug)]
pub enum CellError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Connection closed by instrument")]
    Disconnected,

    #[error("Timeout")]
    Timeout,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Frame invalid: {0}")]
    FrameInvalid(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl CellError {
    /// Check whether this error means the link is dead and must be
    /// reinitialized before further use.
    ///
    /// Only end-of-stream is fatal to a worker; every other error leaves
    /// the connection usable.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, CellError::Disconnected)
    }
}

/// Result type alias for CellAdvisor operations
pub type CellResult<T> = Result<T, CellError>;
