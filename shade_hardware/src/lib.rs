#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Hardware backends for the shade controller.
//!
//! Without the `hardware` feature this crate provides deterministic
//! simulations of the motion engine, angle sensor, and key/value store, good
//! enough to exercise the whole control loop on a desktop. With `hardware`
//! enabled (Linux only) it adds GPIO-backed implementations via `rppal`.

pub mod error;
pub mod util;

#[cfg(feature = "hardware")]
pub mod hardware;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shade_traits::{AngleSensor, MotionEngine, Storage};

use crate::error::HwError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn poisoned() -> BoxError {
    Box::new(HwError::Sim("state lock poisoned"))
}

#[derive(Debug)]
struct SimState {
    position: i32,
    target: i32,
    running: bool,
    speed_hz: u32,
    /// Physical obstruction: travel stops dead here, like a stall guard
    /// force-stop at the end of the rail.
    hard_stop_at: Option<i32>,
}

/// Simulated motion engine.
///
/// Time is quantized: every `is_running` poll advances the position by up to
/// `speed_hz * quantum` microsteps toward the target, so tests and the sim
/// CLI run deterministically without real sleeps.
#[derive(Clone)]
pub struct SimulatedMotionEngine {
    state: Arc<Mutex<SimState>>,
    quantum: Duration,
}

impl SimulatedMotionEngine {
    pub fn new(quantum: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                position: 0,
                target: 0,
                running: false,
                speed_hz: 1_000,
                hard_stop_at: None,
            })),
            quantum,
        }
    }

    /// Place (or clear) a physical obstruction.
    pub fn set_hard_stop(&self, at: Option<i32>) {
        if let Ok(mut s) = self.state.lock() {
            s.hard_stop_at = at;
        }
    }

    fn steps_per_poll(speed_hz: u32, quantum: Duration) -> i32 {
        let steps = u128::from(speed_hz) * quantum.as_millis() / 1_000;
        i32::try_from(steps.max(1)).unwrap_or(i32::MAX)
    }
}

impl MotionEngine for SimulatedMotionEngine {
    fn move_to(&mut self, target: i32) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        s.target = target;
        s.running = s.target != s.position;
        tracing::debug!(target, "sim move");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        // Deceleration is below the quantum resolution; stop in place.
        s.target = s.position;
        s.running = false;
        Ok(())
    }

    fn force_stop(&mut self) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        s.target = s.position;
        s.running = false;
        Ok(())
    }

    fn is_running(&mut self) -> Result<bool, BoxError> {
        let quantum = self.quantum;
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        if !s.running {
            return Ok(false);
        }
        let step = Self::steps_per_poll(s.speed_hz, quantum);
        let delta = (s.target - s.position).clamp(-step, step);
        let before = s.position;
        s.position += delta;
        // The stop only blocks travel that reaches it, not travel away.
        if let Some(limit) = s.hard_stop_at {
            let crossed = (delta > 0 && before < limit && s.position >= limit)
                || (delta < 0 && before > limit && s.position <= limit);
            if crossed {
                s.position = limit;
                s.target = limit;
                s.running = false;
                tracing::debug!(limit, "sim hit hard stop");
                return Ok(false);
            }
        }
        s.running = s.position != s.target;
        Ok(s.running)
    }

    fn current_position(&mut self) -> Result<i32, BoxError> {
        Ok(self.state.lock().map_err(|_| poisoned())?.position)
    }

    fn target_position(&mut self) -> Result<i32, BoxError> {
        Ok(self.state.lock().map_err(|_| poisoned())?.target)
    }

    fn set_current_position(&mut self, position: i32) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        s.position = position;
        s.target = position;
        s.running = false;
        Ok(())
    }

    fn set_speed_hz(&mut self, hz: u32) -> Result<(), BoxError> {
        self.state.lock().map_err(|_| poisoned())?.speed_hz = hz;
        Ok(())
    }

    fn set_acceleration(&mut self, _accel: u32) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Simulated magnetic angle sensor geared to a [`SimulatedMotionEngine`].
///
/// Reads the engine's position and converts it to a 0..=4095 shaft angle.
/// An adjustable slip offset models the belt skipping on the pulley.
pub struct SimulatedAngleSensor {
    engine: Arc<Mutex<SimState>>,
    microsteps_per_rev: i64,
    slip: Arc<Mutex<i32>>,
}

impl SimulatedAngleSensor {
    pub fn new(engine: &SimulatedMotionEngine, microsteps_per_rev: u32) -> Self {
        Self {
            engine: engine.state.clone(),
            microsteps_per_rev: i64::from(microsteps_per_rev.max(1)),
            slip: Arc::new(Mutex::new(0)),
        }
    }

    /// Steps the motor has turned that the shaft has not.
    pub fn set_slip_steps(&self, steps: i32) {
        if let Ok(mut s) = self.slip.lock() {
            *s = steps;
        }
    }

    pub fn slip_control(&self) -> Arc<Mutex<i32>> {
        self.slip.clone()
    }
}

impl AngleSensor for SimulatedAngleSensor {
    fn read_angle(&mut self) -> Result<u16, BoxError> {
        let position = self.engine.lock().map_err(|_| poisoned())?.position;
        let slip = *self.slip.lock().map_err(|_| poisoned())?;
        let shaft = i64::from(position) - i64::from(slip);
        let ticks = (shaft * 4096 / self.microsteps_per_rev).rem_euclid(4096);
        // rem_euclid keeps ticks in 0..4096
        Ok(u16::try_from(ticks).unwrap_or(0))
    }
}

/// Volatile in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, i32>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get_int(&mut self, key: &str, default: i32) -> Result<i32, BoxError> {
        let values = self.values.lock().map_err(|_| poisoned())?;
        Ok(values.get(key).copied().unwrap_or(default))
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), BoxError> {
        let mut values = self.values.lock().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed store: one `key=value` line per entry, rewritten atomically
/// on every put so a power cut leaves either the old or the new state.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: HashMap<String, i32>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> crate::error::Result<Self> {
        let path = path.into();
        let mut values = HashMap::new();
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                for line in text.lines() {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let (key, raw) = line
                        .split_once('=')
                        .ok_or_else(|| HwError::Parse(line.to_string()))?;
                    let value = raw
                        .trim()
                        .parse::<i32>()
                        .map_err(|_| HwError::Parse(line.to_string()))?;
                    values.insert(key.trim().to_string(), value);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "state file absent, starting fresh");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Self { path, values })
    }

    fn flush(&self) -> std::io::Result<()> {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        let mut out = String::new();
        for key in keys {
            if let Some(value) = self.values.get(key) {
                out.push_str(key);
                out.push('=');
                out.push_str(&value.to_string());
                out.push('\n');
            }
        }
        util::write_atomic(&self.path, out.as_bytes())
    }
}

impl Storage for FileStore {
    fn get_int(&mut self, key: &str, default: i32) -> Result<i32, BoxError> {
        Ok(self.values.get(key).copied().unwrap_or(default))
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), BoxError> {
        self.values.insert(key.to_string(), value);
        self.flush()?;
        Ok(())
    }
}
