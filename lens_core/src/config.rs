//! Runtime parameters of an actuator instance.
//!
//! These are the validated structs used by `VcmActuator`. They are separate
//! from the TOML-deserialized config in `lens_config`.

use crate::error::{BuildError, Result};
use crate::table::RegionMap;

/// Largest code the 10-bit VCM DAC accepts.
pub const DAC_MAX_CODE: u16 = 1023;

/// Settle time around enable-line transitions, in milliseconds.
pub const POWER_SETTLE_MS: u64 = 1;

/// Ringing control register values of the VCM driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingingParams {
    /// De-ring control.
    pub ring_ctrl: u8,
    /// bit0: ring mode (0 = 2x, 1 = 1x the VCM period), bit1: PWM (0) or linear (1) drive.
    pub mode: u8,
    /// Ringing frequency code, `383 - 19200 / f_ring`.
    pub freq: u8,
}

impl RingingParams {
    /// Frequency register value for a mechanical ringing frequency in Hz.
    ///
    /// Saturates to `0..=255`; non-finite or non-positive input yields 0.
    pub fn freq_for_resonance(hz: f32) -> u8 {
        if !(hz.is_finite() && hz > 0.0) {
            return 0;
        }
        (383.0 - 19200.0 / hz).round().clamp(0.0, 255.0) as u8
    }
}

impl Default for RingingParams {
    fn default() -> Self {
        Self {
            ring_ctrl: 0x02,
            mode: 0x03,
            freq: 0xAF,
        }
    }
}

/// A `num / den` lens quantity as reported to the camera stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Value as f64; a zero denominator yields 0.0.
    pub fn as_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            f64::from(self.num) / f64::from(self.den)
        }
    }
}

/// Static optics of the lens module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LensInfo {
    /// mm
    pub focal_length: Rational,
    pub f_number: Rational,
    /// um
    pub pixel_size: Rational,
    /// um
    pub total_focus_distance: Rational,
}

/// Everything needed to build the step table and drive the actuator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActuatorParams {
    pub initial_code: u16,
    pub total_steps: u16,
    pub max_code: u16,
    /// Step count the AF algorithm uses for coarse search.
    pub gross_steps: u16,
    /// Step count the AF algorithm uses for fine search.
    pub fine_steps: u16,
    pub regions: RegionMap,
    pub ringing: RingingParams,
}

impl ActuatorParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_code > DAC_MAX_CODE {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "max_code exceeds the 10-bit DAC range",
            )));
        }
        if self.initial_code > self.max_code {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "initial_code must be <= max_code",
            )));
        }
        if self.fine_steps > self.gross_steps.max(1) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "fine_steps must not exceed gross_steps",
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resonance_formula_matches_datasheet_example() {
        // 75.3 Hz mechanical ringing -> 128
        assert_eq!(RingingParams::freq_for_resonance(75.3), 128);
    }

    #[test]
    fn resonance_formula_saturates() {
        assert_eq!(RingingParams::freq_for_resonance(10.0), 0);
        assert_eq!(RingingParams::freq_for_resonance(10_000.0), 255);
        assert_eq!(RingingParams::freq_for_resonance(f32::NAN), 0);
        assert_eq!(RingingParams::freq_for_resonance(0.0), 0);
    }

    #[test]
    fn rational_handles_zero_den() {
        assert_eq!(Rational::new(46, 10).as_f64(), 4.6);
        assert_eq!(Rational::new(1, 0).as_f64(), 0.0);
    }
}
