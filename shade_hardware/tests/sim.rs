use std::time::Duration;

use rstest::rstest;
use shade_hardware::{SimulatedAngleSensor, SimulatedMotionEngine};
use shade_traits::{AngleSensor, MotionEngine};

fn engine() -> SimulatedMotionEngine {
    // 1_000 Hz default speed and a 100 ms quantum: 100 steps per poll.
    SimulatedMotionEngine::new(Duration::from_millis(100))
}

#[rstest]
fn reaches_the_target_and_reports_done() {
    let mut e = engine();
    e.move_to(250).expect("move");
    let mut polls = 0;
    while e.is_running().expect("poll") {
        polls += 1;
        assert!(polls < 100, "sim never finished");
    }
    assert_eq!(e.current_position().expect("pos"), 250);
    assert_eq!(e.target_position().expect("target"), 250);
}

#[rstest]
fn hard_stop_halts_travel_short_of_the_target() {
    let mut e = engine();
    e.set_hard_stop(Some(120));
    e.move_to(1_000).expect("move");
    while e.is_running().expect("poll") {}
    assert_eq!(e.current_position().expect("pos"), 120);
}

#[rstest]
fn force_stop_freezes_the_position() {
    let mut e = engine();
    e.move_to(1_000).expect("move");
    assert!(e.is_running().expect("poll"));
    let mid = e.current_position().expect("pos");
    e.force_stop().expect("force stop");
    assert!(!e.is_running().expect("poll"));
    assert_eq!(e.current_position().expect("pos"), mid);
}

#[rstest]
fn retarget_reverses_without_losing_position() {
    let mut e = engine();
    e.move_to(300).expect("move");
    assert!(e.is_running().expect("poll")); // at 100
    e.move_to(0).expect("retarget");
    while e.is_running().expect("poll") {}
    assert_eq!(e.current_position().expect("pos"), 0);
}

#[rstest]
fn angle_sensor_follows_the_motor_minus_slip() {
    let mut e = engine();
    // 4_096 microsteps per rev makes one tick per microstep.
    let mut sensor = SimulatedAngleSensor::new(&e, 4_096);
    assert_eq!(sensor.read_angle().expect("angle"), 0);

    e.move_to(100).expect("move");
    while e.is_running().expect("poll") {}
    assert_eq!(sensor.read_angle().expect("angle"), 100);

    sensor.set_slip_steps(30);
    assert_eq!(sensor.read_angle().expect("angle"), 70);
}

#[rstest]
fn angle_wraps_at_one_revolution() {
    let mut e = engine();
    let mut sensor = SimulatedAngleSensor::new(&e, 4_096);
    e.set_speed_hz(50_000).expect("speed");
    e.move_to(4_100).expect("move");
    while e.is_running().expect("poll") {}
    assert_eq!(sensor.read_angle().expect("angle"), 4);
}
