//! Closed-loop position from the rotary angle sensor.
//!
//! The sensor reports an absolute angle in 0..4095 that wraps every
//! mechanical turn. `AngleReconciler` unwraps consecutive readings into a
//! monotonic logical tick count and converts it to motor microsteps, so the
//! supervisor can cross-check the open-loop step count after each move.
//! This component never issues motion commands.

use crate::util::div_round_nearest_i64;

/// Ticks per sensor revolution.
pub const TICKS_PER_REV: i32 = 4096;
const HALF_REV: i32 = TICKS_PER_REV / 2;

#[derive(Debug, Clone)]
pub struct AngleReconciler {
    microsteps_per_rev: i64,
    last_ticks: Option<u16>,
    logical_ticks: i64,
}

impl AngleReconciler {
    pub fn new(microsteps_per_rev: u32) -> Self {
        Self {
            microsteps_per_rev: i64::from(microsteps_per_rev.max(1)),
            last_ticks: None,
            logical_ticks: 0,
        }
    }

    /// Re-anchor the logical tick count to a known motor position. Used at
    /// startup and whenever the step counter is redefined (calibration).
    /// The next `sample` re-baselines the raw angle without producing a delta.
    pub fn seed_from_steps(&mut self, steps: i32) {
        self.logical_ticks =
            div_round_nearest_i64(i64::from(steps) * i64::from(TICKS_PER_REV), self.microsteps_per_rev);
        self.last_ticks = None;
    }

    /// Fold one raw reading into the logical position.
    ///
    /// Shortest-path unwrap: assumes the poll rate is high enough that true
    /// motion between samples never exceeds half a revolution.
    pub fn sample(&mut self, raw: u16) -> i64 {
        let raw = raw % TICKS_PER_REV as u16;
        if let Some(prev) = self.last_ticks {
            let mut delta = i32::from(raw) - i32::from(prev);
            if delta > HALF_REV {
                delta -= TICKS_PER_REV;
            } else if delta < -HALF_REV {
                delta += TICKS_PER_REV;
            }
            self.logical_ticks += i64::from(delta);
        }
        self.last_ticks = Some(raw);
        self.logical_ticks
    }

    pub fn logical_ticks(&self) -> i64 {
        self.logical_ticks
    }

    /// Logical position translated into the motor microstep domain.
    pub fn motor_steps(&self) -> i32 {
        div_round_nearest_i64(self.logical_ticks * self.microsteps_per_rev, i64::from(TICKS_PER_REV))
            as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_forward_across_the_seam() {
        // 4090 -> 4095 -> 2 -> 10 is +16 ticks of forward motion, not a
        // -4093 jump at the wrap.
        let mut r = AngleReconciler::new(3200);
        let readings = [4090u16, 4095, 2, 10];
        let mut last = i64::MIN;
        for raw in readings {
            let t = r.sample(raw);
            assert!(t >= last, "logical position must advance monotonically");
            last = t;
        }
        assert_eq!(r.logical_ticks(), 16);
    }

    #[test]
    fn unwraps_reverse_across_the_seam() {
        let mut r = AngleReconciler::new(3200);
        for raw in [10u16, 2, 4095, 4090] {
            r.sample(raw);
        }
        assert_eq!(r.logical_ticks(), -16);
    }

    #[test]
    fn converts_ticks_to_motor_steps() {
        // 3200 microsteps/rev over 4096 ticks/rev: one full turn of ticks
        // is exactly one turn of microsteps.
        let mut r = AngleReconciler::new(3200);
        r.sample(0);
        for raw in [1024u16, 2048, 3072, 0] {
            r.sample(raw);
        }
        assert_eq!(r.logical_ticks(), 4096);
        assert_eq!(r.motor_steps(), 3200);
    }

    #[test]
    fn seeding_anchors_and_rebaselines() {
        let mut r = AngleReconciler::new(3200);
        r.seed_from_steps(25_000);
        assert_eq!(r.motor_steps(), 25_000);
        // First sample after a seed sets the baseline without a delta.
        r.sample(1234);
        assert_eq!(r.motor_steps(), 25_000);
        r.sample(1334);
        assert_eq!(r.logical_ticks(), 32_100);
        assert_eq!(r.motor_steps(), 25_078); // round(32100 * 3200 / 4096)
    }
}
