//! Test doubles for the hardware seams.
//!
//! All doubles share interior state through `Arc`, so a test can keep a
//! clone for assertions after handing the double to the supervisor.
//!
//! `ScriptedEngine` is a kinematic stand-in for the step generator: each
//! `is_running` poll advances the position a fixed number of steps toward
//! the target. An optional jam position models the driver's hardware
//! stall-stop (the DIAG interrupt force-stops the engine directly, without
//! going through the supervisor).

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use shade_traits::{AngleSensor, MotionEngine, Storage};

type BoxError = Box<dyn Error + Send + Sync>;

fn poisoned() -> BoxError {
    Box::new(std::io::Error::other("mock state poisoned"))
}

#[derive(Debug, Default, Clone)]
pub struct EngineState {
    pub position: i32,
    pub target: i32,
    pub running: bool,
    /// Steps of progress per `is_running` poll.
    pub steps_per_poll: i32,
    /// Hard obstruction: reaching it force-stops the engine, the way the
    /// driver's stall guard does at a travel limit.
    pub jam_at: Option<i32>,

    // Spy counters
    pub moves: Vec<i32>,
    pub force_stops: usize,
    pub decel_stops: usize,
    pub speeds: Vec<u32>,
    pub accelerations: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct ScriptedEngine {
    state: Arc<Mutex<EngineState>>,
}

impl ScriptedEngine {
    pub fn new(steps_per_poll: i32) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                steps_per_poll: steps_per_poll.max(1),
                ..EngineState::default()
            })),
        }
    }

    pub fn set_jam(&self, jam_at: Option<i32>) {
        if let Ok(mut s) = self.state.lock() {
            s.jam_at = jam_at;
        }
    }

    /// Copy of the full spy state for assertions.
    pub fn snapshot(&self) -> EngineState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl MotionEngine for ScriptedEngine {
    fn move_to(&mut self, target: i32) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        s.moves.push(target);
        s.target = target;
        s.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        s.decel_stops += 1;
        s.running = false;
        s.target = s.position;
        Ok(())
    }

    fn force_stop(&mut self) -> Result<(), BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        s.force_stops += 1;
        s.running = false;
        s.target = s.position;
        Ok(())
    }

    fn is_running(&mut self) -> Result<bool, BoxError> {
        let mut s = self.state.lock().map_err(|_| poisoned())?;
        if !s.running {
            return Ok(false);
        }
        let step = s.steps_per_poll.min((s.target - s.position).abs());
        s.position += if s.target >= s.position { step } else { -step };
        if let Some(jam) = s.jam_at {
            let blocked = if s.target >= jam {
                s.position >= jam
            } else {
                s.position <= jam
            };
            if blocked {
                s.position = jam;
                s.target = jam;
                s.running = false;
                return Ok(false);
            }
        }
        if s.position == s.target {
            s.running = false;
        }
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
        Ok(())
    }

    fn set_speed_hz(&mut self, hz: u32) -> Result<(), BoxError> {
        self.state.lock().map_err(|_| poisoned())?.speeds.push(hz);
        Ok(())
    }

    fn set_acceleration(&mut self, accel: u32) -> Result<(), BoxError> {
        self.state
            .lock()
            .map_err(|_| poisoned())?
            .accelerations
            .push(accel);
        Ok(())
    }
}

/// Sensor that replays a scripted tick sequence, then repeats the last value.
pub struct ScriptedAngle {
    readings: Vec<u16>,
    idx: usize,
}

impl ScriptedAngle {
    pub fn new(readings: Vec<u16>) -> Self {
        Self { readings, idx: 0 }
    }
}

impl AngleSensor for ScriptedAngle {
    fn read_angle(&mut self) -> Result<u16, BoxError> {
        let raw = self.readings.get(self.idx).copied().unwrap_or_else(|| {
            self.readings.last().copied().unwrap_or(0)
        });
        if self.idx < self.readings.len() {
            self.idx += 1;
        }
        Ok(raw)
    }
}

/// In-memory key/value store with optional write-failure injection.
#[derive(Debug, Default, Clone)]
pub struct MemStorage {
    values: Arc<Mutex<HashMap<String, i32>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: &[(&str, i32)]) -> Self {
        let store = Self::default();
        if let Ok(mut map) = store.values.lock() {
            map.extend(values.iter().map(|(k, v)| (k.to_string(), *v)));
        }
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut f) = self.fail_writes.lock() {
            *f = fail;
        }
    }

    pub fn get(&self, key: &str) -> Option<i32> {
        self.values.lock().ok().and_then(|m| m.get(key).copied())
    }
}

impl Storage for MemStorage {
    fn get_int(&mut self, key: &str, default: i32) -> Result<i32, BoxError> {
        let map = self.values.lock().map_err(|_| poisoned())?;
        Ok(*map.get(key).unwrap_or(&default))
    }

    fn put_int(&mut self, key: &str, value: i32) -> Result<(), BoxError> {
        if *self.fail_writes.lock().map_err(|_| poisoned())? {
            return Err(Box::new(std::io::Error::other("write failed")));
        }
        self.values
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value);
        Ok(())
    }
}
