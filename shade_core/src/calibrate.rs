//! Two-phase travel calibration: "drive to an extreme and measure where it
//! naturally stopped".
//!
//! Neither phase requires the user to know physical distances; both end at a
//! hard mechanical or electrical stop (a stall) or an explicit stop, and the
//! reached position becomes the new reference. The two phases are mutually
//! exclusive by construction: this controller is the only owner of
//! `CalibrationState`.

use crate::error::ShadeError;
use crate::status::CalibrationState;

/// Far-beyond-travel target for calibration moves. Matches `i32::MAX - 1`
/// so a decelerating engine can never overshoot past the type range.
pub const CALIBRATION_SENTINEL: i32 = 2_147_483_646;

/// What the supervisor must apply after a calibration move terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// SetMax: the reached position is the new travel maximum.
    Max { new_max: i32 },
    /// SetMin: the travel maximum shifted to preserve the old max relative
    /// to the newly discovered zero; the step counter must be reset to 0.
    Min { new_max: i32 },
}

#[derive(Debug)]
pub struct CalibrationController {
    state: CalibrationState,
    /// Position remembered when SetMin was armed, before the counter was
    /// moved to the sentinel.
    min_offset: i32,
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationController {
    pub fn new() -> Self {
        Self {
            state: CalibrationState::Idle,
            min_offset: 0,
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != CalibrationState::Idle
    }

    /// Arm the SetMax phase. Rejected while any phase is active.
    pub fn arm_set_max(&mut self) -> Result<(), ShadeError> {
        if self.is_active() {
            return Err(ShadeError::InvalidState("calibration already in progress"));
        }
        self.state = CalibrationState::SettingMax;
        Ok(())
    }

    /// Arm the SetMin phase, remembering where the counter currently sits.
    pub fn arm_set_min(&mut self, current_position: i32) -> Result<(), ShadeError> {
        if self.is_active() {
            return Err(ShadeError::InvalidState("calibration already in progress"));
        }
        self.min_offset = current_position;
        self.state = CalibrationState::SettingMin;
        Ok(())
    }

    /// Natural termination of a calibration move: compute the commit and
    /// return to `Idle`. `None` when no phase was active.
    pub fn commit(&mut self, reached: i32, max_position: i32) -> Option<Commit> {
        match self.state {
            CalibrationState::Idle => None,
            CalibrationState::SettingMax => {
                self.state = CalibrationState::Idle;
                Some(Commit::Max { new_max: reached })
            }
            CalibrationState::SettingMin => {
                self.state = CalibrationState::Idle;
                let distance_traveled = CALIBRATION_SENTINEL - reached;
                Some(Commit::Min {
                    new_max: max_position
                        .saturating_add(distance_traveled)
                        .saturating_sub(self.min_offset),
                })
            }
        }
    }

    /// Discard any uncommitted phase (stall or explicit interruption).
    /// Returns what was in flight so the caller can physically undo it;
    /// SetMin in particular left the step counter at the sentinel.
    pub fn abort(&mut self) -> Option<Aborted> {
        let aborted = match self.state {
            CalibrationState::Idle => None,
            CalibrationState::SettingMax => Some(Aborted::Max),
            CalibrationState::SettingMin => Some(Aborted::Min {
                min_offset: self.min_offset,
            }),
        };
        self.state = CalibrationState::Idle;
        aborted
    }
}

/// Phase discarded by [`CalibrationController::abort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aborted {
    Max,
    /// The counter was redefined to the sentinel when the phase was armed;
    /// `min_offset` is the physical position it held at that moment.
    Min { min_offset: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_mutually_exclusive() {
        let mut c = CalibrationController::new();
        c.arm_set_max().unwrap();
        assert!(matches!(
            c.arm_set_min(0),
            Err(ShadeError::InvalidState(_))
        ));
        assert!(matches!(c.arm_set_max(), Err(ShadeError::InvalidState(_))));
        assert_eq!(c.state(), CalibrationState::SettingMax);
    }

    #[test]
    fn set_max_commits_reached_position() {
        let mut c = CalibrationController::new();
        c.arm_set_max().unwrap();
        assert_eq!(
            c.commit(48_731, 50_000),
            Some(Commit::Max { new_max: 48_731 })
        );
        assert_eq!(c.state(), CalibrationState::Idle);
    }

    #[test]
    fn set_min_preserves_old_max_relative_to_new_zero() {
        let mut c = CalibrationController::new();
        // Armed at position 1_000; counter then jumps to the sentinel and
        // drives down, stopping 3_000 short of it.
        c.arm_set_min(1_000).unwrap();
        let reached = CALIBRATION_SENTINEL - 3_000;
        assert_eq!(
            c.commit(reached, 50_000),
            Some(Commit::Min { new_max: 52_000 })
        );
    }

    #[test]
    fn abort_discards_without_commit() {
        let mut c = CalibrationController::new();
        c.arm_set_max().unwrap();
        assert_eq!(c.abort(), Some(Aborted::Max));
        assert_eq!(c.commit(123, 50_000), None);
        assert_eq!(c.abort(), None);
    }

    #[test]
    fn aborted_set_min_reports_the_armed_offset() {
        let mut c = CalibrationController::new();
        c.arm_set_min(1_000).unwrap();
        assert_eq!(c.abort(), Some(Aborted::Min { min_offset: 1_000 }));
        assert_eq!(c.state(), CalibrationState::Idle);
    }
}
