//! Hardware assembly and command execution.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use shade_core::runner::RunOutcome;
use shade_core::{Supervisor, TickStatus};
use shade_traits::{Clock, MonotonicClock};

/// The built controller plus whatever must stay alive while it runs.
pub struct Assembled {
    pub supervisor: Supervisor,
    pub tick_interval: Duration,
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    _diag: Option<shade_hardware::hardware::DiagGuard>,
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn assemble(cfg: &shade_config::Config) -> eyre::Result<Assembled> {
    use shade_hardware::{FileStore, SimulatedAngleSensor, SimulatedMotionEngine};

    let motor: shade_core::MotorCfg = (&cfg.motor).into();
    let control: shade_core::ControlCfg = (&cfg.control).into();
    let tick_interval = Duration::from_millis(control.tick_interval_ms);

    let engine = SimulatedMotionEngine::new(tick_interval);
    // Give the simulated rail an end so calibration runs terminate.
    if let Ok(raw) = std::env::var("SHADE_SIM_HARD_STOP")
        && let Ok(limit) = raw.parse::<i32>()
    {
        engine.set_hard_stop(Some(limit));
        tracing::info!(limit, "simulated hard stop enabled");
    }
    let store = FileStore::open(&cfg.storage.path)
        .wrap_err_with(|| format!("open state file {}", cfg.storage.path))?;

    let builder = Supervisor::builder()
        .with_engine(engine.clone())
        .with_store(store)
        .with_motor(motor.clone())
        .with_control(control)
        .with_report(|percent| tracing::info!(percent, "position report"));
    let builder = if cfg.encoder.enabled {
        builder.with_sensor(SimulatedAngleSensor::new(&engine, motor.microsteps_per_rev()))
    } else {
        builder
    };

    tracing::info!("running against simulated hardware");
    Ok(Assembled {
        supervisor: builder.build()?,
        tick_interval,
    })
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn assemble(cfg: &shade_config::Config) -> eyre::Result<Assembled> {
    use shade_hardware::FileStore;
    use shade_hardware::hardware::{GpioMotionEngine, attach_stall_interrupt};

    let motor: shade_core::MotorCfg = (&cfg.motor).into();
    let control: shade_core::ControlCfg = (&cfg.control).into();
    let tick_interval = Duration::from_millis(control.tick_interval_ms);

    let engine = GpioMotionEngine::new(
        cfg.pins.motor_step,
        cfg.pins.motor_dir,
        cfg.pins.motor_en,
        cfg.motor.reverse_direction,
    )
    .wrap_err("open motor pins")?;
    let store = FileStore::open(&cfg.storage.path)
        .wrap_err_with(|| format!("open state file {}", cfg.storage.path))?;

    let supervisor = Supervisor::builder()
        .with_engine(engine)
        .with_store(store)
        .with_motor(motor)
        .with_control(control)
        .with_report(|percent| tracing::info!(percent, "position report"))
        .build()?;

    let diag = match cfg.pins.diag {
        Some(pin) => {
            let handle = supervisor.stall_handle();
            match attach_stall_interrupt(pin, move || handle.trip()) {
                Ok(guard) => {
                    tracing::info!(pin, "stall guard enabled");
                    Some(guard)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to init stall guard; continuing without it");
                    None
                }
            }
        }
        None => None,
    };

    Ok(Assembled {
        supervisor,
        tick_interval,
        _diag: diag,
    })
}

/// Run the polling loop until the current command ends. A shutdown request
/// (Ctrl-C) decelerates to a stop and lets the loop terminate naturally, so
/// the final position still gets persisted and reported.
pub fn drive(
    supervisor: &mut Supervisor,
    tick_interval: Duration,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<RunOutcome> {
    let clock = MonotonicClock::new();
    let mut stop_requested = false;
    let mut ticks: u64 = 0;
    loop {
        if shutdown.load(Ordering::SeqCst) && !stop_requested {
            tracing::warn!("interrupt received; decelerating to a stop");
            supervisor.stop()?;
            stop_requested = true;
        }
        let status = supervisor.tick()?;
        ticks += 1;
        match status {
            TickStatus::Moving => clock.sleep(tick_interval),
            _ => return Ok(RunOutcome { status, ticks }),
        }
    }
}

pub fn status_name(status: TickStatus) -> &'static str {
    match status {
        TickStatus::Idle => "idle",
        TickStatus::Moving => "moving",
        TickStatus::Completed { .. } => "completed",
        TickStatus::Stalled { .. } => "stalled",
    }
}
