//! `From` implementations bridging `shade_config` types to `shade_core` types.
//!
//! These keep field-by-field mapping out of the CLI.

use crate::config::{ControlCfg, MotorCfg};

impl From<&shade_config::Motor> for MotorCfg {
    fn from(c: &shade_config::Motor) -> Self {
        Self {
            microsteps: c.microsteps,
            full_steps_per_rev: c.full_steps_per_rev,
            max_speed_hz: c.max_speed_hz,
            acceleration: c.acceleration,
        }
    }
}

impl From<&shade_config::Control> for ControlCfg {
    fn from(c: &shade_config::Control) -> Self {
        Self {
            slip_tolerance_steps: c.slip_tolerance_steps,
            calibration_speed_divisor: c.calibration_speed_divisor,
            stall_debounce_ticks: c.stall_debounce_ticks,
            tick_interval_ms: c.tick_interval_ms,
        }
    }
}
