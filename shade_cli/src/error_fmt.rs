//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use shade_core::error::{AbortReason, BuildError, ShadeError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingEngine => {
                "What happened: No motion engine was provided to the controller.\nLikely causes: GPIO init failed or the engine was not wired into the builder.\nHow to fix: Ensure the stepper driver initializes and is passed via with_engine(...).".to_string()
            }
            BuildError::MissingStore => {
                "What happened: No storage backend was provided to the controller.\nLikely causes: The state file could not be opened or was not wired into the builder.\nHow to fix: Check storage.path in the config and filesystem permissions.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<ShadeError>() {
        return match se {
            ShadeError::Stall => {
                "What happened: The motor stalled and the move was aborted.\nLikely causes: Obstructed travel, binding mechanics, or stall sensitivity set too high.\nHow to fix: Clear the obstruction; raise control.stall_debounce_ticks if it trips on clean travel.".to_string()
            }
            ShadeError::CalibrationAborted(reason) => {
                let cause = match reason {
                    AbortReason::Stall => "the motor stalled mid-phase",
                    AbortReason::Stopped => "the run was interrupted",
                };
                format!(
                    "What happened: Calibration was aborted ({cause}) and nothing was committed.\nLikely causes: Obstruction during the calibration creep, or an operator stop.\nHow to fix: Clear the travel path and rerun set-min / set-max."
                )
            }
            ShadeError::Hardware(msg) => format!(
                "What happened: A hardware operation failed ({msg}).\nLikely causes: Wrong pin numbers, wiring/power issues, or insufficient GPIO permissions.\nHow to fix: Check [pins] in the config and that the process may access GPIO."
            ),
            ShadeError::Persistence(msg) => format!(
                "What happened: Saving controller state failed ({msg}).\nLikely causes: Read-only filesystem or a bad storage.path.\nHow to fix: Point storage.path at a writable location."
            ),
            ShadeError::InvalidState(msg) => format!(
                "What happened: The command is not valid right now ({msg}).\nHow to fix: Wait for the current operation to finish, then retry."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes for scripting; non-domain errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use shade_core::error::ShadeError;
    match err.downcast_ref::<ShadeError>() {
        Some(ShadeError::InvalidState(_)) => 2,
        Some(ShadeError::Stall) => 3,
        Some(ShadeError::CalibrationAborted(_)) => 4,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    use shade_core::error::ShadeError;

    let reason = match err.downcast_ref::<ShadeError>() {
        Some(ShadeError::Stall) => "Stall",
        Some(ShadeError::CalibrationAborted(_)) => "CalibrationAborted",
        Some(ShadeError::Hardware(_)) => "Hardware",
        Some(ShadeError::Persistence(_)) => "Persistence",
        Some(ShadeError::InvalidState(_)) => "InvalidState",
        None => "Error",
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
