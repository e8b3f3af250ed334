//! Drives the supervisor's polling loop at a fixed tick interval until the
//! current command reaches a terminal status.
//!
//! The supervisor itself never blocks; pacing lives here, behind the
//! `Clock` seam so tests can run the loop deterministically.

use std::time::Duration;

use shade_traits::Clock;

use crate::error::Result;
use crate::status::TickStatus;
use crate::supervisor::Supervisor;

/// How a run ended, plus how many ticks it took.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub status: TickStatus,
    pub ticks: u64,
}

/// Poll until the supervisor reports `Completed`, `Stalled`, or `Idle`.
///
/// `max_ticks` bounds the loop for callers that cannot tolerate an engine
/// that never reports completion (there is deliberately no motion timeout
/// in the controller itself). `None` polls forever.
pub fn run_to_completion(
    supervisor: &mut Supervisor,
    clock: &dyn Clock,
    tick_interval: Duration,
    max_ticks: Option<u64>,
) -> Result<RunOutcome> {
    let mut ticks: u64 = 0;
    loop {
        let status = supervisor.tick()?;
        ticks += 1;
        match status {
            TickStatus::Moving => {
                if let Some(budget) = max_ticks
                    && ticks >= budget
                {
                    tracing::warn!(ticks, "tick budget exhausted with move still running");
                    return Ok(RunOutcome { status, ticks });
                }
                clock.sleep(tick_interval);
            }
            TickStatus::Idle | TickStatus::Completed { .. } | TickStatus::Stalled { .. } => {
                return Ok(RunOutcome { status, ticks });
            }
        }
    }
}
