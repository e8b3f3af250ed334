//! Stall confirmation: priority over completion, hard stop, debounce, and
//! single outward report.

use std::sync::{Arc, Mutex};

use rstest::rstest;
use shade_core::mocks::{MemStorage, ScriptedEngine};
use shade_core::{Command, ControlCfg, MotorCfg, Supervisor, TickStatus};

fn build_with_control(
    engine: &ScriptedEngine,
    store: &MemStorage,
    control: ControlCfg,
) -> (Supervisor, Arc<Mutex<Vec<i32>>>) {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let writer = sink.clone();
    let sup = Supervisor::builder()
        .with_engine(engine.clone())
        .with_store(store.clone())
        .with_motor(MotorCfg::default())
        .with_control(control)
        .with_report(move |p| {
            if let Ok(mut v) = writer.lock() {
                v.push(p);
            }
        })
        .build()
        .expect("supervisor build");
    (sup, sink)
}

#[rstest]
fn stall_preempts_completion_and_hard_stops() {
    let engine = ScriptedEngine::new(1_000);
    let store = MemStorage::new();
    let (mut sup, sink) = build_with_control(&engine, &store, ControlCfg::default());
    let stall = sup.stall_handle();

    sup.handle(Command::MoveToPosition(10_000)).expect("move");
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);

    stall.trip();
    match sup.tick().expect("tick") {
        TickStatus::Stalled { percent } => {
            // Stopped at 1_000 of 50_000.
            assert_eq!(percent, 2);
        }
        other => panic!("expected Stalled, got {other:?}"),
    }
    let snap = engine.snapshot();
    assert_eq!(snap.force_stops, 1);
    assert_eq!(snap.decel_stops, 0);
    assert_eq!(sink.lock().expect("sink").as_slice(), &[2]);

    // Terminal for this command; no automatic retry.
    assert_eq!(sup.tick().expect("tick"), TickStatus::Idle);
    assert_eq!(sink.lock().expect("sink").len(), 1);
}

#[rstest]
fn debounce_delays_confirmation_by_configured_ticks() {
    let engine = ScriptedEngine::new(100);
    let store = MemStorage::new();
    let control = ControlCfg {
        stall_debounce_ticks: 3,
        ..ControlCfg::default()
    };
    let (mut sup, _) = build_with_control(&engine, &store, control);
    let stall = sup.stall_handle();

    sup.move_to_position(10_000).expect("move");
    stall.trip();
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);
    assert!(matches!(
        sup.tick().expect("tick"),
        TickStatus::Stalled { .. }
    ));
}

#[rstest]
fn stale_latch_without_a_move_is_dropped() {
    let engine = ScriptedEngine::new(1_000);
    let store = MemStorage::new();
    let (mut sup, sink) = build_with_control(&engine, &store, ControlCfg::default());
    let stall = sup.stall_handle();

    stall.trip();
    assert_eq!(sup.tick().expect("tick"), TickStatus::Idle);
    assert!(sink.lock().expect("sink").is_empty());

    // The dropped latch must not abort the next command.
    sup.move_to_position(2_000).expect("move");
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);
    assert!(matches!(
        sup.tick().expect("tick"),
        TickStatus::Completed { .. }
    ));
}

#[rstest]
fn stalled_position_is_persisted() {
    let engine = ScriptedEngine::new(1_000);
    let store = MemStorage::new();
    let (mut sup, _) = build_with_control(&engine, &store, ControlCfg::default());
    let stall = sup.stall_handle();

    sup.move_to_position(10_000).expect("move");
    assert_eq!(sup.tick().expect("tick"), TickStatus::Moving);
    stall.trip();
    assert!(matches!(
        sup.tick().expect("tick"),
        TickStatus::Stalled { .. }
    ));
    assert_eq!(store.get("position"), Some(1_000));
}
