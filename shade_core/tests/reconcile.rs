//! Encoder-vs-open-loop reconciliation after completed moves: within the
//! slip tolerance the step count stands; beyond it the encoder wins.

use rstest::rstest;
use shade_core::mocks::{MemStorage, ScriptedAngle, ScriptedEngine};
use shade_core::{ControlCfg, MotorCfg, Supervisor, TickStatus};

/// Geometry chosen so one encoder tick equals one microstep (4096/rev),
/// which keeps the arithmetic in these tests transparent.
fn one_to_one_motor() -> MotorCfg {
    MotorCfg {
        microsteps: 16,
        full_steps_per_rev: 256,
        max_speed_hz: 8_000,
        acceleration: 4_000,
    }
}

fn build(engine: &ScriptedEngine, store: &MemStorage, readings: Vec<u16>) -> Supervisor {
    Supervisor::builder()
        .with_engine(engine.clone())
        .with_store(store.clone())
        .with_sensor(ScriptedAngle::new(readings))
        .with_motor(one_to_one_motor())
        .with_control(ControlCfg::default())
        .build()
        .expect("supervisor build")
}

#[rstest]
fn slip_beyond_tolerance_adopts_the_encoder_position() {
    let engine = ScriptedEngine::new(500);
    let store = MemStorage::new();
    // The motor was commanded 1_000 steps but the encoder only saw 500:
    // half the motion slipped.
    let mut sup = build(&engine, &store, vec![0, 500]);

    sup.move_to_position(1_000).expect("move");
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving); // sample 0 (baseline)
    match sup.tick().expect("tick") {
        // sample 500, engine reports done at 1_000
        TickStatus::Completed { .. } => {}
        other => panic!("expected Completed, got {other:?}"),
    }
    assert_eq!(sup.position(), 500, "encoder-derived position must win");
    assert_eq!(engine.snapshot().position, 500);
    assert_eq!(store.get("position"), Some(500));
}

#[rstest]
fn slip_within_tolerance_keeps_the_open_loop_count() {
    let engine = ScriptedEngine::new(500);
    let store = MemStorage::new();
    // Encoder lands 3 ticks short; default tolerance is 4 steps.
    let mut sup = build(&engine, &store, vec![0, 997]);

    sup.move_to_position(1_000).expect("move");
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);
    assert!(matches!(
        sup.tick().expect("tick"),
        TickStatus::Completed { .. }
    ));
    assert_eq!(sup.position(), 1_000);
    assert_eq!(engine.snapshot().position, 1_000);
}

#[rstest]
fn open_loop_build_skips_reconciliation() {
    let engine = ScriptedEngine::new(500);
    let store = MemStorage::new();
    let mut sup = Supervisor::builder()
        .with_engine(engine.clone())
        .with_store(store.clone())
        .with_motor(one_to_one_motor())
        .build()
        .expect("supervisor build");

    sup.move_to_position(1_000).expect("move");
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);
    assert!(matches!(
        sup.tick().expect("tick"),
        TickStatus::Completed { .. }
    ));
    assert_eq!(sup.position(), 1_000);
}
