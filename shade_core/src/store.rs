//! Persisted position state over the `Storage` seam.
//!
//! Writes happen only at the end of a completed move, never per step, to
//! bound write amplification on flash-backed stores. A persistence fault is
//! never fatal: the in-memory value stays authoritative and a warning is
//! logged.

use shade_traits::Storage;

use crate::error::ShadeError;

pub const POSITION_KEY: &str = "position";
pub const MAX_POSITION_KEY: &str = "max_position";

/// Travel maximum assumed until the user runs a calibration.
pub const DEFAULT_MAX_POSITION: i32 = 50_000;

pub struct PositionStore {
    backing: Box<dyn Storage>,
}

impl PositionStore {
    pub fn new(backing: Box<dyn Storage>) -> Self {
        Self { backing }
    }

    /// Load `(position, max_position)`, falling back to defaults on a read
    /// fault or absent keys. `max_position` is floored at 0.
    pub fn load(&mut self) -> (i32, i32) {
        let position = match self.backing.get_int(POSITION_KEY, 0) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "position load failed; assuming 0");
                0
            }
        };
        let max_position = match self.backing.get_int(MAX_POSITION_KEY, DEFAULT_MAX_POSITION) {
            Ok(v) => v.max(0),
            Err(e) => {
                tracing::warn!(error = %e, "max position load failed; using default");
                DEFAULT_MAX_POSITION
            }
        };
        (position, max_position)
    }

    /// Persist the current position. Best-effort.
    pub fn save(&mut self, position: i32) {
        if let Err(e) = self.backing.put_int(POSITION_KEY, position) {
            let err = ShadeError::Persistence(e.to_string());
            tracing::warn!(error = %err, position, "position save failed; keeping in-memory value");
        }
    }

    /// Persist a newly calibrated travel maximum. Best-effort.
    pub fn save_max(&mut self, max_position: i32) {
        if let Err(e) = self.backing.put_int(MAX_POSITION_KEY, max_position) {
            let err = ShadeError::Persistence(e.to_string());
            tracing::warn!(error = %err, max_position, "max position save failed; keeping in-memory value");
        }
    }
}

impl core::fmt::Debug for PositionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PositionStore").finish_non_exhaustive()
    }
}
