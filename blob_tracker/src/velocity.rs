//! Distance → velocity.
//!
//! Closer is louder.  Distances between the near and far bounds map linearly
//! onto 127‥0; anything nearer saturates at 127, anything farther at 0.

use crate::ConfigError;

/// Highest MIDI velocity / controller value.
pub const MAX_VELOCITY: u8 = 127;

/// Clamped linear interpolation of `value` from `[in_lo, in_hi]` onto
/// `[out_lo, out_hi]`.
pub fn map_clamped(value: f32, in_lo: f32, in_hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    let t = (value - in_lo) / (in_hi - in_lo);
    let out = out_lo + t * (out_hi - out_lo);
    let (lo, hi) = if out_lo <= out_hi { (out_lo, out_hi) } else { (out_hi, out_lo) };
    out.clamp(lo, hi)
}

/// Near/far distance bounds for the velocity mapping, in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityCurve {
    near_mm: f32,
    far_mm:  f32,
}

impl VelocityCurve {
    pub const DEFAULT_NEAR_MM: f32 = 472.0;
    pub const DEFAULT_FAR_MM:  f32 = 648.0;

    pub fn new(near_mm: f32, far_mm: f32) -> Result<Self, ConfigError> {
        if !near_mm.is_finite() || !far_mm.is_finite() || near_mm >= far_mm {
            return Err(ConfigError::InvalidDistanceRange { near_mm, far_mm });
        }
        Ok(VelocityCurve { near_mm, far_mm })
    }

    pub fn near_mm(&self) -> f32 { self.near_mm }
    pub fn far_mm(&self)  -> f32 { self.far_mm }

    /// `127 - map(distance, near, far, 0, 127)`, with the mapped value
    /// truncated to a whole step before subtracting.
    ///
    /// A missing depth reading (NaN) yields 0.
    pub fn velocity_for(&self, distance_mm: f32) -> u8 {
        if distance_mm.is_nan() {
            return 0;
        }
        let mapped = map_clamped(
            distance_mm,
            self.near_mm,
            self.far_mm,
            0.0,
            MAX_VELOCITY as f32,
        );
        MAX_VELOCITY - mapped as u8
    }
}

impl Default for VelocityCurve {
    fn default() -> Self {
        VelocityCurve {
            near_mm: Self::DEFAULT_NEAR_MM,
            far_mm:  Self::DEFAULT_FAR_MM,
        }
    }
}
