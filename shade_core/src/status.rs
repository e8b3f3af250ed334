//! Controller state enums and the per-tick status.

/// Motion lifecycle of the actuator.
///
/// `Stalled` is transient: the tick that confirms a stall reports it outward
/// and returns to `Stopped`, so a new command is always accepted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Stopped,
    Moving,
    Stalled,
}

/// Which calibration phase, if any, is in flight. Exactly one variant holds
/// at any instant; arming a phase while another is active is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Idle,
    SettingMin,
    SettingMax,
}

/// Public status of a single iteration of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// No move in progress.
    Idle,
    /// A move (possibly a calibration move) is still running.
    Moving,
    /// The move finished naturally; position persisted, percent reported.
    Completed { percent: i32 },
    /// A stall was confirmed; motor hard-stopped, percent reported.
    /// Terminal for the current command, never retried automatically.
    Stalled { percent: i32 },
}

impl TickStatus {
    /// True for statuses that end the current command.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TickStatus::Completed { .. } | TickStatus::Stalled { .. })
    }
}
