//! Top-level motion controller: accepts percentage/absolute commands,
//! arbitrates direction reversals, drives the motion engine, polls for
//! completion and stalls, reconciles the encoder against the open-loop
//! count, persists position, and reports the final percentage outward.

use eyre::WrapErr;
use shade_traits::{AngleSensor, MotionEngine};

use crate::calibrate::{Aborted, CALIBRATION_SENTINEL, CalibrationController, Commit};
use crate::config::{ControlCfg, MotorCfg};
use crate::encoder::AngleReconciler;
use crate::error::{Result, ShadeError};
use crate::stall::{StallDetector, StallHandle};
use crate::status::{CalibrationState, MotionState, TickStatus};
use crate::store::PositionStore;
use crate::util::{percent_to_steps, steps_to_percent};

/// Inbound command set. Everything a transport can ask of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveToPercent(i32),
    MoveToPosition(i32),
    Stop,
    SetMin,
    SetMax,
}

/// Callback invoked exactly once per completed move and once per confirmed
/// stall, with the rounded position percentage.
pub type ReportFn = Box<dyn FnMut(i32)>;

pub struct Supervisor {
    engine: Box<dyn MotionEngine>,
    sensor: Option<Box<dyn AngleSensor>>,
    store: PositionStore,
    calibration: CalibrationController,
    stall: StallDetector,
    reconciler: AngleReconciler,
    motor: MotorCfg,
    control: ControlCfg,
    report: Option<ReportFn>,

    motion_state: MotionState,
    position: i32,
    max_position: i32,
}

impl core::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Supervisor")
            .field("position", &self.position)
            .field("max_position", &self.max_position)
            .field("motion_state", &self.motion_state)
            .field("calibration", &self.calibration.state())
            .finish()
    }
}

fn hw(e: Box<dyn std::error::Error + Send + Sync>) -> eyre::Report {
    eyre::Report::new(ShadeError::Hardware(e.to_string()))
}

impl Supervisor {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        engine: Box<dyn MotionEngine>,
        sensor: Option<Box<dyn AngleSensor>>,
        store: PositionStore,
        stall: StallDetector,
        reconciler: AngleReconciler,
        motor: MotorCfg,
        control: ControlCfg,
        report: Option<ReportFn>,
        position: i32,
        max_position: i32,
    ) -> Self {
        Self {
            engine,
            sensor,
            store,
            calibration: CalibrationController::new(),
            stall,
            reconciler,
            motor,
            control,
            report,
            motion_state: MotionState::Stopped,
            position,
            max_position,
        }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn max_position(&self) -> i32 {
        self.max_position
    }

    pub fn motion_state(&self) -> MotionState {
        self.motion_state
    }

    pub fn calibration_state(&self) -> CalibrationState {
        self.calibration.state()
    }

    /// Rounded position percentage; 0 is fully closed.
    pub fn percent(&self) -> i32 {
        steps_to_percent(self.position, self.max_position)
    }

    /// Setter half of the stall latch, for wiring to the DIAG interrupt.
    pub fn stall_handle(&self) -> StallHandle {
        self.stall.handle()
    }

    /// Dispatch one inbound command.
    pub fn handle(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::MoveToPercent(p) => self.move_to_percent(p),
            Command::MoveToPosition(t) => self.move_to_position(t),
            Command::Stop => self.stop(),
            Command::SetMin => self.set_min(),
            Command::SetMax => self.set_max(),
        }
    }

    /// Move to a percentage of the calibrated travel. Out-of-range input is
    /// a caller error; it clamps rather than fails.
    pub fn move_to_percent(&mut self, percent: i32) -> Result<()> {
        let clamped = percent.clamp(-100, 100);
        if clamped != percent {
            tracing::warn!(percent, "percent out of range; clamping");
        }
        self.move_to_position(percent_to_steps(clamped, self.max_position))
    }

    /// Move to an absolute microstep position.
    ///
    /// If a move is in progress and the new target lies on the opposite side
    /// of the current actual position, force-stop first: retargeting a
    /// direction reversal on a moving load is not guaranteed safe in the
    /// engine. No-op when the target equals the current position.
    pub fn move_to_position(&mut self, target: i32) -> Result<()> {
        let target = if self.calibration.is_active() {
            // The travel limit is exactly what calibration is discovering.
            target
        } else {
            target.clamp(0, self.max_position)
        };

        let current = self.engine.current_position().map_err(hw)?;
        if self.motion_state == MotionState::Moving {
            let in_flight = self.engine.target_position().map_err(hw)?;
            let reversal =
                (i64::from(target) - i64::from(current)) * (i64::from(in_flight) - i64::from(current)) < 0;
            if reversal {
                self.engine.force_stop().map_err(hw).wrap_err("reversal stop")?;
            }
        }

        if target == current {
            return Ok(());
        }

        if self.motion_state != MotionState::Moving {
            self.stall.clear();
        }
        self.engine.move_to(target).map_err(hw).wrap_err("move_to")?;
        self.motion_state = MotionState::Moving;
        tracing::debug!(target, current, "move issued");
        Ok(())
    }

    /// Decelerate to a stop. Safe to call in any state, including when no
    /// move is active. Does not clear calibration state; the interrupted
    /// phase resolves at the next tick like any natural termination.
    pub fn stop(&mut self) -> Result<()> {
        self.engine.stop().map_err(hw).wrap_err("stop")
    }

    /// Start the SetMax phase: creep toward a far sentinel and let the hard
    /// travel limit end the move.
    pub fn set_max(&mut self) -> Result<()> {
        self.calibration.arm_set_max().map_err(eyre::Report::new)?;
        if let Err(e) = self.begin_calibration_move(CALIBRATION_SENTINEL) {
            self.abort_setup(0);
            return Err(e);
        }
        tracing::info!("set-max calibration started");
        Ok(())
    }

    /// Start the SetMin phase: jump the counter to the sentinel and creep
    /// toward 0; the distance actually traveled defines the new zero.
    pub fn set_min(&mut self) -> Result<()> {
        let current = self.engine.current_position().map_err(hw)?;
        self.calibration.arm_set_min(current).map_err(eyre::Report::new)?;
        if let Err(e) = self
            .engine
            .set_current_position(CALIBRATION_SENTINEL)
            .map_err(hw)
        {
            // Counter never moved; nothing physical to undo.
            let _ = self.calibration.abort();
            tracing::warn!(
                error = %ShadeError::CalibrationAborted(crate::error::AbortReason::Stopped),
                "calibration setup failed"
            );
            return Err(e);
        }
        self.reconciler.seed_from_steps(CALIBRATION_SENTINEL);
        if let Err(e) = self.begin_calibration_move(0) {
            self.abort_setup(CALIBRATION_SENTINEL);
            return Err(e);
        }
        tracing::info!("set-min calibration started");
        Ok(())
    }

    fn begin_calibration_move(&mut self, target: i32) -> Result<()> {
        let divisor = self.control.calibration_speed_divisor.max(1);
        self.engine
            .set_speed_hz((self.motor.max_speed_hz / divisor).max(1))
            .map_err(hw)
            .wrap_err("calibration speed")?;
        self.move_to_position(target)
    }

    /// Unwind a calibration phase whose setup failed before any motion.
    /// `counter` is where the engine's step counter sits at the failure
    /// point; only an armed SetMin needs it to restore a physical value.
    fn abort_setup(&mut self, counter: i32) {
        tracing::warn!(
            error = %ShadeError::CalibrationAborted(crate::error::AbortReason::Stopped),
            "calibration setup failed"
        );
        if let Some(aborted) = self.calibration.abort()
            && let Err(e) = self.unwind_abort(aborted, counter)
        {
            tracing::warn!(error = %e, "counter restore failed after calibration setup error");
        }
    }

    /// Physically undo a discarded phase: restore cruise speed, and for
    /// SetMin move the counter back from sentinel space to the position the
    /// distance actually traveled implies. A restore below the old zero is
    /// floored at 0.
    fn unwind_abort(&mut self, aborted: Aborted, reached: i32) -> Result<()> {
        if let Err(e) = self.engine.set_speed_hz(self.motor.max_speed_hz) {
            tracing::warn!(error = %e, "speed restore failed after aborted calibration");
        }
        if let Aborted::Min { min_offset } = aborted {
            let traveled = i64::from(CALIBRATION_SENTINEL) - i64::from(reached);
            let restored = (i64::from(min_offset) - traveled).clamp(0, i64::from(i32::MAX));
            let restored = i32::try_from(restored).unwrap_or(0);
            self.engine
                .set_current_position(restored)
                .map_err(hw)
                .wrap_err("restore counter after aborted set-min")?;
            self.reconciler.seed_from_steps(restored);
        }
        Ok(())
    }

    /// One iteration of the polling loop. Non-blocking.
    ///
    /// Stall has the highest priority: a confirmed stall hard-stops the
    /// motor, aborts any in-flight calibration without committing, and is
    /// reported outward as the end of the current command.
    pub fn tick(&mut self) -> Result<TickStatus> {
        if self.motion_state != MotionState::Moving {
            // A latch tripped with no move in flight is stale; drop it so it
            // cannot abort the next command.
            self.stall.clear();
            return Ok(TickStatus::Idle);
        }

        if self.stall.poll() {
            return self.confirm_stall();
        }

        // Sample the encoder every tick so the unwrap assumption (less than
        // half a revolution per poll) holds while the motor is running.
        if let Some(sensor) = self.sensor.as_mut() {
            let raw = sensor.read_angle().map_err(hw).wrap_err("angle read")?;
            self.reconciler.sample(raw);
        }

        if self.engine.is_running().map_err(hw)? {
            return Ok(TickStatus::Moving);
        }
        self.finish_move()
    }

    fn confirm_stall(&mut self) -> Result<TickStatus> {
        self.engine
            .force_stop()
            .map_err(hw)
            .wrap_err("force stop on stall")?;
        self.motion_state = MotionState::Stalled;

        let reached = self.engine.current_position().map_err(hw)?;
        if let Some(aborted) = self.calibration.abort() {
            self.unwind_abort(aborted, reached)?;
            tracing::warn!(
                error = %ShadeError::CalibrationAborted(crate::error::AbortReason::Stall),
                "calibration discarded"
            );
        }

        self.position = self.engine.current_position().map_err(hw)?;
        self.store.save(self.position);
        let percent = self.percent();
        tracing::warn!(position = self.position, percent, "motor stalled");
        self.emit(percent);
        // Reported; the command is over and new commands are accepted.
        self.motion_state = MotionState::Stopped;
        Ok(TickStatus::Stalled { percent })
    }

    /// Natural termination: commit calibration if one was in flight,
    /// otherwise cross-check the encoder, then persist and report.
    fn finish_move(&mut self) -> Result<TickStatus> {
        self.motion_state = MotionState::Stopped;
        let reached = self.engine.current_position().map_err(hw)?;

        match self.calibration.commit(reached, self.max_position) {
            Some(Commit::Max { new_max }) => {
                self.max_position = new_max.max(0);
                self.store.save_max(self.max_position);
                self.restore_speed()?;
                self.reconciler.seed_from_steps(reached);
                tracing::info!(max_position = self.max_position, "travel maximum calibrated");
            }
            Some(Commit::Min { new_max }) => {
                self.max_position = new_max.max(0);
                self.store.save_max(self.max_position);
                self.engine
                    .set_current_position(0)
                    .map_err(hw)
                    .wrap_err("zero counter after set-min")?;
                self.restore_speed()?;
                self.reconciler.seed_from_steps(0);
                tracing::info!(max_position = self.max_position, "travel zero calibrated");
            }
            None => {
                // The motor is not guaranteed loss-free; beyond the slip
                // tolerance the encoder-derived position wins.
                if let Some(sensor) = self.sensor.as_mut() {
                    // One more sample so the logical position includes the
                    // final quantum of motion.
                    let raw = sensor.read_angle().map_err(hw).wrap_err("angle read")?;
                    self.reconciler.sample(raw);
                    let derived = self.reconciler.motor_steps();
                    let slip = i64::from(derived) - i64::from(reached);
                    if slip.abs() > i64::from(self.control.slip_tolerance_steps) {
                        tracing::warn!(
                            open_loop = reached,
                            encoder = derived,
                            slip,
                            "slip detected; adopting encoder position"
                        );
                        self.engine
                            .set_current_position(derived)
                            .map_err(hw)
                            .wrap_err("slip correction")?;
                    }
                }
            }
        }

        self.position = self.engine.current_position().map_err(hw)?;
        self.store.save(self.position);
        let percent = self.percent();
        tracing::info!(position = self.position, percent, "move complete");
        self.emit(percent);
        Ok(TickStatus::Completed { percent })
    }

    fn restore_speed(&mut self) -> Result<()> {
        self.engine
            .set_speed_hz(self.motor.max_speed_hz)
            .map_err(hw)
            .wrap_err("speed restore")
    }

    fn emit(&mut self, percent: i32) {
        if let Some(report) = self.report.as_mut() {
            report(percent);
        }
    }
}
