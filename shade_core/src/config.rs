//! Core-side configuration structs with conservative defaults.

/// Stepper geometry and motion-engine parameters.
///
/// Defaults match a NEMA-class motor at 16x microstepping: 3 rev/s cruise,
/// half of that as the acceleration ramp.
#[derive(Debug, Clone)]
pub struct MotorCfg {
    /// Microsteps per full step as programmed into the driver.
    pub microsteps: u32,
    /// Full mechanical steps per revolution (200 for 1.8° motors).
    pub full_steps_per_rev: u32,
    /// Cruise speed in microsteps per second.
    pub max_speed_hz: u32,
    /// Acceleration in microsteps per second squared.
    pub acceleration: u32,
}

impl MotorCfg {
    /// Microsteps per mechanical revolution; also the encoder conversion base.
    #[inline]
    pub fn microsteps_per_rev(&self) -> u32 {
        self.microsteps * self.full_steps_per_rev
    }
}

impl Default for MotorCfg {
    fn default() -> Self {
        let microsteps = 16;
        let full_steps_per_rev = 200;
        let max_speed_hz = microsteps * full_steps_per_rev * 3;
        Self {
            microsteps,
            full_steps_per_rev,
            max_speed_hz,
            acceleration: max_speed_hz / 2,
        }
    }
}

/// Supervisor policy knobs.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Open-loop vs encoder discrepancy (microsteps) beyond which the
    /// encoder-derived position wins after a completed move.
    pub slip_tolerance_steps: i32,
    /// Calibration moves run at `max_speed_hz / calibration_speed_divisor`
    /// since the travel limit is unknown during calibration.
    pub calibration_speed_divisor: u32,
    /// Consecutive polls the stall latch must be observed before a stall is
    /// confirmed. 1 means the first poll after the interrupt confirms.
    pub stall_debounce_ticks: u8,
    /// Polling loop period in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            slip_tolerance_steps: 4,
            calibration_speed_divisor: 4,
            stall_debounce_ticks: 1,
            tick_interval_ms: 10,
        }
    }
}
