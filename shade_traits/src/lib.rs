pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Trapezoidal step-pulse generator for one stepper axis.
///
/// Implementations own the acceleration profile; the controller only issues
/// absolute targets and observes completion by polling `is_running`.
/// Positions are in motor microsteps relative to whatever
/// `set_current_position` last established.
pub trait MotionEngine {
    /// Start (or retarget) a move to an absolute position.
    fn move_to(&mut self, target: i32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Decelerate to a stop along the configured ramp.
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Stop immediately, without deceleration. Used on stall.
    fn force_stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn is_running(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
    fn current_position(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
    /// The target of the move in progress (or of the last move).
    fn target_position(&mut self) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
    /// Redefine the current physical position without moving.
    fn set_current_position(
        &mut self,
        position: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_speed_hz(&mut self, hz: u32) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_acceleration(
        &mut self,
        accel: u32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Absolute rotary angle sensor, one mechanical turn per 4096 ticks.
pub trait AngleSensor {
    /// Raw angle in 0..=4095.
    fn read_angle(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Non-volatile integer key/value store.
pub trait Storage {
    fn get_int(
        &mut self,
        key: &str,
        default: i32,
    ) -> Result<i32, Box<dyn std::error::Error + Send + Sync>>;
    fn put_int(
        &mut self,
        key: &str,
        value: i32,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
