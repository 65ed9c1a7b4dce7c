//! Worker state machine

/// Worker state
///
/// Tracks the lifecycle of one worker slot so transitions can be logged
/// and verified.
///
/// # State Transitions
/// ```text
/// Idle -> Dispatching (on request arrival or heartbeat-timer expiry)
/// Dispatching -> AwaitingReply (command sent to the instrument)
/// Dispatching -> Idle (recovered locally, e.g. missing argument)
/// AwaitingReply -> Idle (reply delivered or transient error)
/// Dispatching | AwaitingReply -> Terminated (end of stream)
/// Idle -> Terminated (shutdown)
/// Terminated -> Reconnecting (supervisor reinitializes the link)
/// Reconnecting -> Idle (fresh worker takes over the slot)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a request or the heartbeat timer
    Idle,
    /// Validating and sending a command
    Dispatching,
    /// Command sent, waiting for the instrument's reply
    AwaitingReply,
    /// Link is being reinitialized by the supervisor
    Reconnecting,
    /// Worker exited; the slot is dead until the supervisor restarts it
    Terminated,
}

impl WorkerState {
    /// Check whether a transition to `next` is legal
    pub fn can_transition_to(&self, next: WorkerState) -> bool {
        matches!(
            (*self, next),
            (WorkerState::Idle, WorkerState::Dispatching)
                | (WorkerState::Idle, WorkerState::Terminated)
                | (WorkerState::Dispatching, WorkerState::AwaitingReply)
                | (WorkerState::Dispatching, WorkerState::Idle)
                | (WorkerState::Dispatching, WorkerState::Terminated)
                | (WorkerState::AwaitingReply, WorkerState::Idle)
                | (WorkerState::AwaitingReply, WorkerState::Terminated)
                | (WorkerState::Terminated, WorkerState::Reconnecting)
                | (WorkerState::Reconnecting, WorkerState::Idle)
        )
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "Idle",
            WorkerState::Dispatching => "Dispatching",
            WorkerState::AwaitingReply => "AwaitingReply",
            WorkerState::Reconnecting => "Reconnecting",
            WorkerState::Terminated => "Terminated",
        }
    }
}

impl Default for WorkerState {
    fn default() -> Self {
        WorkerState::Idle
    }
}
