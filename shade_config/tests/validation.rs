use rstest::rstest;
use shade_config::load_toml;

const MINIMAL: &str = r#"
[pins]
motor_step = 13
motor_dir = 19
"#;

#[rstest]
fn minimal_config_parses_with_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.motor.microsteps, 16);
    assert_eq!(cfg.motor.max_speed_hz, 9_600);
    assert_eq!(cfg.control.slip_tolerance_steps, 4);
    assert_eq!(cfg.control.calibration_speed_divisor, 4);
    assert!(!cfg.encoder.enabled);
    assert_eq!(cfg.storage.path, "shade_state.kv");
}

#[rstest]
fn missing_pins_section_is_a_parse_error() {
    let err = load_toml("[motor]\nmicrosteps = 16\n").expect_err("must fail");
    assert!(format!("{err}").contains("pins"));
}

#[rstest]
#[case("[motor]\nmicrosteps = 0", "microsteps")]
#[case("[motor]\nfull_steps_per_rev = 0", "full_steps_per_rev")]
#[case("[motor]\nmax_speed_hz = 0", "max_speed_hz")]
#[case("[motor]\nacceleration = 0", "acceleration")]
#[case("[control]\ncalibration_speed_divisor = 0", "calibration_speed_divisor")]
#[case("[control]\nslip_tolerance_steps = -1", "slip_tolerance_steps")]
#[case("[control]\ntick_interval_ms = 0", "tick_interval_ms")]
#[case("[storage]\npath = \"\"", "storage.path")]
fn out_of_range_values_are_rejected(#[case] section: &str, #[case] needle: &str) {
    let toml = format!("{MINIMAL}\n{section}\n");
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("must reject");
    assert!(
        format!("{err}").contains(needle),
        "error {err} missing {needle}"
    );
}

#[rstest]
fn identical_step_and_dir_pins_are_rejected() {
    let toml = "[pins]\nmotor_step = 13\nmotor_dir = 13\n";
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("must reject");
    assert!(format!("{err}").contains("must differ"));
}

#[rstest]
fn full_config_round_trips_every_section() {
    let toml = r#"
[pins]
motor_step = 13
motor_dir = 19
motor_en = 26
diag = 21

[motor]
microsteps = 32
full_steps_per_rev = 200
max_speed_hz = 12000
acceleration = 6000
reverse_direction = true

[control]
slip_tolerance_steps = 8
calibration_speed_divisor = 2
stall_debounce_ticks = 3
tick_interval_ms = 5

[encoder]
enabled = true

[storage]
path = "/var/lib/shade/state.kv"

[logging]
level = "debug"
file = "/var/log/shade.jsonl"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.pins.diag, Some(21));
    assert!(cfg.motor.reverse_direction);
    assert_eq!(cfg.control.stall_debounce_ticks, 3);
    assert!(cfg.encoder.enabled);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}
