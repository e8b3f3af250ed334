//! Type-state builder for [`Supervisor`]. The motion engine and the storage
//! backend are mandatory; `build()` only exists once both are set, while
//! `try_build()` reports what is missing as a typed error from any state.

use std::marker::PhantomData;

use shade_traits::{AngleSensor, MotionEngine, Storage};

use crate::config::{ControlCfg, MotorCfg};
use crate::encoder::AngleReconciler;
use crate::error::{BuildError, Result};
use crate::stall::StallDetector;
use crate::store::PositionStore;
use crate::supervisor::{ReportFn, Supervisor};

// Type-state markers
pub struct Missing;
pub struct Set;

pub struct SupervisorBuilder<E, St> {
    engine: Option<Box<dyn MotionEngine>>,
    store: Option<Box<dyn Storage>>,
    sensor: Option<Box<dyn AngleSensor>>,
    motor: Option<MotorCfg>,
    control: Option<ControlCfg>,
    report: Option<ReportFn>,
    _e: PhantomData<E>,
    _st: PhantomData<St>,
}

impl Default for SupervisorBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            engine: None,
            store: None,
            sensor: None,
            motor: None,
            control: None,
            report: None,
            _e: PhantomData,
            _st: PhantomData,
        }
    }
}

impl Supervisor {
    pub fn builder() -> SupervisorBuilder<Missing, Missing> {
        SupervisorBuilder::default()
    }
}

/// Chainable setters that do not affect type-state.
impl<E, St> SupervisorBuilder<E, St> {
    /// Optional closed-loop angle sensor. Without one the controller runs
    /// purely open loop and slip goes uncorrected.
    pub fn with_sensor(mut self, sensor: impl AngleSensor + 'static) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    pub fn with_motor(mut self, motor: MotorCfg) -> Self {
        self.motor = Some(motor);
        self
    }

    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    /// Outward report sink; called once per completed move or confirmed
    /// stall with the rounded percentage.
    pub fn with_report<F>(mut self, report: F) -> Self
    where
        F: FnMut(i32) + 'static,
    {
        self.report = Some(Box::new(report));
        self
    }

    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Supervisor> {
        let SupervisorBuilder {
            engine,
            store,
            sensor,
            motor,
            control,
            report,
            _e: _,
            _st: _,
        } = self;

        let mut engine = engine.ok_or_else(|| eyre::Report::new(BuildError::MissingEngine))?;
        let store = store.ok_or_else(|| eyre::Report::new(BuildError::MissingStore))?;
        let motor = motor.unwrap_or_default();
        let control = control.unwrap_or_default();

        if motor.microsteps == 0 || motor.full_steps_per_rev == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "motor geometry must be non-zero",
            )));
        }
        if motor.max_speed_hz == 0 || motor.acceleration == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "speed and acceleration must be > 0",
            )));
        }
        if control.calibration_speed_divisor == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "calibration_speed_divisor must be > 0",
            )));
        }
        if control.slip_tolerance_steps < 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "slip_tolerance_steps must be >= 0",
            )));
        }
        if control.tick_interval_ms == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "tick_interval_ms must be >= 1",
            )));
        }

        let mut store = PositionStore::new(store);
        let (position, max_position) = store.load();

        // Prime the engine with the persisted position and motion profile.
        // A failure here means the device cannot operate; it is fatal at
        // startup, not recoverable at runtime.
        engine
            .set_current_position(position)
            .map_err(|e| eyre::Report::new(crate::error::ShadeError::Hardware(e.to_string())))?;
        engine
            .set_speed_hz(motor.max_speed_hz)
            .map_err(|e| eyre::Report::new(crate::error::ShadeError::Hardware(e.to_string())))?;
        engine
            .set_acceleration(motor.acceleration)
            .map_err(|e| eyre::Report::new(crate::error::ShadeError::Hardware(e.to_string())))?;

        let mut reconciler = AngleReconciler::new(motor.microsteps_per_rev());
        reconciler.seed_from_steps(position);
        let stall = StallDetector::new(control.stall_debounce_ticks);

        tracing::info!(position, max_position, "supervisor initialized");

        Ok(Supervisor::from_parts(
            engine,
            sensor,
            store,
            stall,
            reconciler,
            motor,
            control,
            report,
            position,
            max_position,
        ))
    }
}

// Setters that advance type-state when providing mandatory components.
impl<St> SupervisorBuilder<Missing, St> {
    pub fn with_engine(self, engine: impl MotionEngine + 'static) -> SupervisorBuilder<Set, St> {
        let SupervisorBuilder {
            engine: _,
            store,
            sensor,
            motor,
            control,
            report,
            _e: _,
            _st: _,
        } = self;
        SupervisorBuilder {
            engine: Some(Box::new(engine)),
            store,
            sensor,
            motor,
            control,
            report,
            _e: PhantomData,
            _st: PhantomData,
        }
    }
}

impl<E> SupervisorBuilder<E, Missing> {
    pub fn with_store(self, store: impl Storage + 'static) -> SupervisorBuilder<E, Set> {
        let SupervisorBuilder {
            engine,
            store: _,
            sensor,
            motor,
            control,
            report,
            _e: _,
            _st: _,
        } = self;
        SupervisorBuilder {
            engine,
            store: Some(Box::new(store)),
            sensor,
            motor,
            control,
            report,
            _e: PhantomData,
            _st: PhantomData,
        }
    }
}

impl SupervisorBuilder<Set, Set> {
    /// Validate and build. Only available once engine and store are set.
    pub fn build(self) -> Result<Supervisor> {
        self.try_build()
    }
}
