//! Quick start: calibrate and position a simulated shade.
//!
//! Run with `cargo run --example quick_start`. The simulated rail has a hard
//! stop at 40_000 microsteps; set-max discovers it, then the controller moves
//! to 50% of the calibrated travel.

use std::time::Duration;

use shade_core::runner::run_to_completion;
use shade_core::{Command, ControlCfg, MotorCfg, Supervisor, TickStatus};
use shade_hardware::{MemoryStore, SimulatedAngleSensor, SimulatedMotionEngine};
use shade_traits::MonotonicClock;

fn main() -> shade_core::Result<()> {
    // Per-poll motion must stay under half an encoder revolution for the
    // closed loop to track: 100 kHz at a 10 ms tick is 1_000 steps/poll,
    // well inside the 1_600-step half-rev of the default geometry.
    let motor = MotorCfg {
        max_speed_hz: 100_000,
        acceleration: 50_000,
        ..MotorCfg::default()
    };

    let engine = SimulatedMotionEngine::new(Duration::from_millis(10));
    engine.set_hard_stop(Some(40_000));
    let sensor = SimulatedAngleSensor::new(&engine, motor.microsteps_per_rev());

    let mut sup = Supervisor::builder()
        .with_engine(engine)
        .with_store(MemoryStore::new())
        .with_sensor(sensor)
        .with_motor(motor)
        .with_control(ControlCfg::default())
        .with_report(|percent| println!("reported: {percent}%"))
        .build()?;

    let clock = MonotonicClock::new();
    let tick = Duration::from_millis(10);

    sup.handle(Command::SetMax)?;
    run_to_completion(&mut sup, &clock, tick, Some(100_000))?;
    println!("calibrated travel: {} steps", sup.max_position());

    sup.handle(Command::MoveToPercent(50))?;
    let outcome = run_to_completion(&mut sup, &clock, tick, Some(100_000))?;
    if let TickStatus::Completed { percent } = outcome.status {
        println!("settled at {percent}% ({} steps)", sup.position());
    }
    Ok(())
}
