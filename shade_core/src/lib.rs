#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Closed-loop position control for a single stepper-driven actuator
//! (hardware-agnostic).
//!
//! All hardware interactions go through the `shade_traits` seams:
//! [`shade_traits::MotionEngine`] for pulse generation,
//! [`shade_traits::AngleSensor`] for the rotary encoder, and
//! [`shade_traits::Storage`] for persistence.
//!
//! ## Architecture
//!
//! - **Position store**: persisted position + calibrated travel maximum
//!   (`store` module)
//! - **Angle reconciler**: encoder unwrap and slip cross-check (`encoder`)
//! - **Stall detector**: interrupt-set atomic latch, debounced on the
//!   polling side (`stall`)
//! - **Calibration**: two-phase set-min/set-max travel discovery
//!   (`calibrate`)
//! - **Supervisor**: command dispatch, the polling loop body, completion
//!   finalization, and outward reporting (`supervisor`)
//!
//! ## Units
//!
//! Positions are motor microsteps; encoder readings are 0..4095 ticks, one
//! mechanical turn per wrap. The externally visible unit is a percentage of
//! the calibrated travel window, 0 = fully closed.

pub mod builder;
pub mod calibrate;
pub mod config;
pub mod conversions;
pub mod encoder;
pub mod error;
pub mod mocks;
pub mod runner;
pub mod stall;
pub mod status;
pub mod store;
pub mod supervisor;
pub mod util;

pub use builder::{Missing, Set, SupervisorBuilder};
pub use calibrate::{CALIBRATION_SENTINEL, CalibrationController, Commit};
pub use config::{ControlCfg, MotorCfg};
pub use encoder::AngleReconciler;
pub use error::{AbortReason, BuildError, Result, ShadeError};
pub use stall::{StallDetector, StallHandle};
pub use status::{CalibrationState, MotionState, TickStatus};
pub use store::{DEFAULT_MAX_POSITION, PositionStore};
pub use supervisor::{Command, Supervisor};
