//! Request and reply types for the dispatch layer

use celladv_core::{CellError, CellResult, InterferencePower};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::oneshot;

/// Command kinds the dispatch layer accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Press a front-panel key (`value` argument required)
    Keypad,
    /// Inject a touch event (`x` and `y` arguments required)
    Touch,
    /// Return the cached screen image, refreshing it when stale
    Screen,
    /// Force a screen cache refresh through the double-checked path
    RefreshScreen,
    /// Status probe, returns the raw status text
    Heartbeat,
    /// Interference power measurement
    InterferencePower,
}

impl CommandKind {
    /// Wire-facing command name, as accepted by [`FromStr`]
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Keypad => "keyp",
            CommandKind::Touch => "touch",
            CommandKind::Screen => "screen",
            CommandKind::RefreshScreen => "refresh_screen",
            CommandKind::Heartbeat => "heartbeat",
            CommandKind::InterferencePower => "interference_power",
        }
    }
}

impl FromStr for CommandKind {
    type Err = CellError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "keyp" => Ok(CommandKind::Keypad),
            "touch" => Ok(CommandKind::Touch),
            "screen" => Ok(CommandKind::Screen),
            "refresh_screen" => Ok(CommandKind::RefreshScreen),
            "heartbeat" => Ok(CommandKind::Heartbeat),
            "interference_power" => Ok(CommandKind::InterferencePower),
            other => Err(CellError::UnknownCommand(other.to_string())),
        }
    }
}

/// Successful outcome of one request
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Raw bytes, e.g. a screen image
    Binary(Vec<u8>),
    /// Small structured success message or status text
    Text(String),
    /// Parsed measurement
    Measurement(InterferencePower),
}

/// Sending half of a per-request reply channel.
///
/// Created per request and discarded after one use; reply channels are
/// never pooled or reused.
pub type ReplySender = oneshot::Sender<CellResult<Reply>>;

/// One queued unit of work for the worker pool
pub struct Request {
    pub(crate) command: CommandKind,
    pub(crate) args: HashMap<String, String>,
    pub(crate) reply: ReplySender,
}

impl Request {
    pub(crate) fn new(
        command: CommandKind,
        args: HashMap<String, String>,
        reply: ReplySender,
    ) -> Self {
        Self {
            command,
            args,
            reply,
        }
    }

    /// Command this request carries
    pub fn command(&self) -> CommandKind {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names_round_trip() {
        for kind in [
            CommandKind::Keypad,
            CommandKind::Touch,
            CommandKind::Screen,
            CommandKind::RefreshScreen,
            CommandKind::Heartbeat,
            CommandKind::InterferencePower,
        ] {
            assert_eq!(kind.name().parse::<CommandKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_command_name() {
        let err = "heyoman".parse::<CommandKind>().unwrap_err();
        assert!(matches!(err, CellError::UnknownCommand(name) if name == "heyoman"));
    }
}
