#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas for the shade controller.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! Sections with sensible defaults may be omitted entirely; only `[pins]`
//! is mandatory because there is no safe default wiring.

use serde::Deserialize;

/// GPIO wiring for the stepper driver and sensors.
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub motor_step: u8,
    pub motor_dir: u8,
    pub motor_en: Option<u8>,
    /// Driver DIAG output; stall detection is disabled when absent.
    pub diag: Option<u8>,
}

/// Stepper geometry and motion profile.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Motor {
    pub microsteps: u32,
    pub full_steps_per_rev: u32,
    /// Cruise speed in microsteps per second.
    pub max_speed_hz: u32,
    /// Ramp in microsteps per second squared.
    pub acceleration: u32,
    /// Invert direction without rewiring.
    pub reverse_direction: bool,
}

impl Default for Motor {
    fn default() -> Self {
        let microsteps = 16;
        let full_steps_per_rev = 200;
        let max_speed_hz = microsteps * full_steps_per_rev * 3;
        Self {
            microsteps,
            full_steps_per_rev,
            max_speed_hz,
            acceleration: max_speed_hz / 2,
            reverse_direction: false,
        }
    }
}

/// Supervisor policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Control {
    /// Open-loop vs encoder discrepancy (microsteps) before the encoder
    /// position overrides the step count.
    pub slip_tolerance_steps: i32,
    /// Calibration moves run at `max_speed_hz / calibration_speed_divisor`.
    pub calibration_speed_divisor: u32,
    /// Consecutive polls before a latched stall is confirmed.
    pub stall_debounce_ticks: u8,
    /// Polling loop period in milliseconds.
    pub tick_interval_ms: u64,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            slip_tolerance_steps: 4,
            calibration_speed_divisor: 4,
            stall_debounce_ticks: 1,
            tick_interval_ms: 10,
        }
    }
}

/// Rotary encoder wiring; the controller runs open loop when absent.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Encoder {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    /// Path to a log file (JSON lines); console-only when absent.
    pub file: Option<String>,
    /// "error" | "warn" | "info" | "debug" | "trace"
    pub level: Option<String>,
}

/// Persistence backend selection.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    /// Key/value file holding position and travel maximum.
    pub path: String,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            path: "shade_state.kv".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub motor: Motor,
    #[serde(default)]
    pub control: Control,
    #[serde(default)]
    pub encoder: Encoder,
    #[serde(default)]
    pub storage: StorageCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.motor.microsteps == 0 {
            eyre::bail!("motor.microsteps must be > 0");
        }
        if self.motor.full_steps_per_rev == 0 {
            eyre::bail!("motor.full_steps_per_rev must be > 0");
        }
        if self.motor.max_speed_hz == 0 {
            eyre::bail!("motor.max_speed_hz must be > 0");
        }
        if self.motor.acceleration == 0 {
            eyre::bail!("motor.acceleration must be > 0");
        }
        if self.control.calibration_speed_divisor == 0 {
            eyre::bail!("control.calibration_speed_divisor must be > 0");
        }
        if self.control.slip_tolerance_steps < 0 {
            eyre::bail!("control.slip_tolerance_steps must be >= 0");
        }
        if self.control.tick_interval_ms == 0 {
            eyre::bail!("control.tick_interval_ms must be >= 1");
        }
        if self.pins.motor_step == self.pins.motor_dir {
            eyre::bail!("pins.motor_step and pins.motor_dir must differ");
        }
        if self.storage.path.is_empty() {
            eyre::bail!("storage.path must not be empty");
        }
        Ok(())
    }
}
