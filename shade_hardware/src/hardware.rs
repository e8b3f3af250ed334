//! GPIO-backed implementations for Raspberry Pi class boards.
//!
//! Step pulses are generated in software from the polling thread: every
//! `is_running` call emits the pulses that elapsed wall time allows. That
//! caps the usable step rate well below a dedicated pulse peripheral, but
//! the control loop above only needs position bookkeeping and completion.

use std::time::{Duration, Instant};

use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use shade_traits::MotionEngine;

use crate::error::{HwError, Result};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

pub struct GpioMotionEngine {
    step: OutputPin,
    dir: OutputPin,
    en: Option<OutputPin>,
    reverse: bool,
    position: i32,
    target: i32,
    running: bool,
    speed_hz: u32,
    last_poll: Instant,
    pulse_debt: f64,
}

impl GpioMotionEngine {
    pub fn new(step_pin: u8, dir_pin: u8, en_pin: Option<u8>, reverse: bool) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err)?;
        let step = gpio.get(step_pin).map_err(gpio_err)?.into_output_low();
        let dir = gpio.get(dir_pin).map_err(gpio_err)?.into_output_low();
        let en = match en_pin {
            // Driver enable is active low.
            Some(pin) => Some(gpio.get(pin).map_err(gpio_err)?.into_output_low()),
            None => None,
        };
        Ok(Self {
            step,
            dir,
            en,
            reverse,
            position: 0,
            target: 0,
            running: false,
            speed_hz: 1_000,
            last_poll: Instant::now(),
            pulse_debt: 0.0,
        })
    }

    fn emit_pulses(&mut self, count: u32, forward: bool) {
        let high = forward != self.reverse;
        if high {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
        let half = Duration::from_micros(500_000 / u64::from(self.speed_hz.max(1)).max(1));
        for _ in 0..count {
            self.step.set_high();
            std::thread::sleep(half);
            self.step.set_low();
            std::thread::sleep(half);
            self.position += if forward { 1 } else { -1 };
            if self.position == self.target {
                break;
            }
        }
    }
}

impl MotionEngine for GpioMotionEngine {
    fn move_to(&mut self, target: i32) -> std::result::Result<(), BoxError> {
        if let Some(en) = self.en.as_mut() {
            en.set_low();
        }
        self.target = target;
        self.running = self.target != self.position;
        self.last_poll = Instant::now();
        self.pulse_debt = 0.0;
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), BoxError> {
        self.target = self.position;
        self.running = false;
        Ok(())
    }

    fn force_stop(&mut self) -> std::result::Result<(), BoxError> {
        self.target = self.position;
        self.running = false;
        self.step.set_low();
        Ok(())
    }

    fn is_running(&mut self) -> std::result::Result<bool, BoxError> {
        if !self.running {
            return Ok(false);
        }
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_poll);
        self.last_poll = now;
        self.pulse_debt += elapsed.as_secs_f64() * f64::from(self.speed_hz);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let due = self.pulse_debt.floor() as u32;
        self.pulse_debt -= f64::from(due);
        let distance = (self.target - self.position).unsigned_abs();
        let count = due.min(distance);
        if count > 0 {
            let forward = self.target > self.position;
            self.emit_pulses(count, forward);
        }
        self.running = self.position != self.target;
        Ok(self.running)
    }

    fn current_position(&mut self) -> std::result::Result<i32, BoxError> {
        Ok(self.position)
    }

    fn target_position(&mut self) -> std::result::Result<i32, BoxError> {
        Ok(self.target)
    }

    fn set_current_position(&mut self, position: i32) -> std::result::Result<(), BoxError> {
        self.position = position;
        self.target = position;
        self.running = false;
        Ok(())
    }

    fn set_speed_hz(&mut self, hz: u32) -> std::result::Result<(), BoxError> {
        self.speed_hz = hz.max(1);
        Ok(())
    }

    fn set_acceleration(&mut self, _accel: u32) -> std::result::Result<(), BoxError> {
        // Software pulse generation has no ramp.
        Ok(())
    }
}

/// Owns the DIAG-pin interrupt registration; drop to detach.
pub struct DiagGuard {
    _pin: InputPin,
}

/// Watch the driver's DIAG line and invoke `on_stall` from the GPIO
/// interrupt thread on every rising edge.
pub fn attach_stall_interrupt(
    diag_pin: u8,
    mut on_stall: impl FnMut() + Send + 'static,
) -> Result<DiagGuard> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let mut pin = gpio.get(diag_pin).map_err(gpio_err)?.into_input_pulldown();
    pin.set_async_interrupt(Trigger::RisingEdge, move |level| {
        if level == Level::High {
            tracing::warn!("stall guard raised DIAG");
            on_stall();
        }
    })
    .map_err(gpio_err)?;
    Ok(DiagGuard { _pin: pin })
}
