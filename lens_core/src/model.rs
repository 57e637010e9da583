//! Actuator models.
//!
//! Each supported VCM driver is one `ActuatorModel`. The register protocol
//! shared by the OV5693-class drivers lives in the trait's provided methods;
//! a model supplies its identity and tuning.

use lens_traits::{DataWidth, RegisterBus};

use crate::config::{ActuatorParams, DAC_MAX_CODE, LensInfo, Rational, RingingParams};
use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::table::{RegionBoundary, RegionMap};

pub const REG_VCM_RING_CTRL: u16 = 0x02;
pub const REG_VCM_CODE_MSB: u16 = 0x03;
pub const REG_VCM_CODE_LSB: u16 = 0x04;
pub const REG_VCM_MODE: u16 = 0x06;
pub const REG_VCM_FREQ: u16 = 0x07;
/// Written with `0x01` once the table is ready to bring the driver out of standby.
pub const REG_VCM_ENABLE: u16 = 0x0001;

/// Single byte register write, mapping the bus error to `ActuatorError`.
pub fn write_byte(bus: &mut dyn RegisterBus, reg: u16, value: u8) -> Result<()> {
    bus.write(reg, u16::from(value), DataWidth::Byte)
        .map_err(|e| {
            tracing::error!(reg, value, error = %e, "register write failed");
            eyre::Report::new(map_hw_error(e.as_ref()))
        })
}

pub trait ActuatorModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// 7-bit bus address of the driver.
    fn i2c_address(&self) -> u16;

    fn default_params(&self) -> ActuatorParams;

    fn lens_info(&self) -> LensInfo;

    /// Program de-ring, drive mode and ringing frequency, in that order.
    fn configure(&self, bus: &mut dyn RegisterBus, ringing: &RingingParams) -> Result<()> {
        write_byte(bus, REG_VCM_RING_CTRL, ringing.ring_ctrl)?;
        write_byte(bus, REG_VCM_MODE, ringing.mode)?;
        write_byte(bus, REG_VCM_FREQ, ringing.freq)
    }

    /// Drive mode and frequency only; issued right after the enable line rises.
    fn wake(&self, bus: &mut dyn RegisterBus, ringing: &RingingParams) -> Result<()> {
        write_byte(bus, REG_VCM_MODE, ringing.mode)?;
        write_byte(bus, REG_VCM_FREQ, ringing.freq)
    }

    fn enable(&self, bus: &mut dyn RegisterBus) -> Result<()> {
        write_byte(bus, REG_VCM_ENABLE, 0x01)
    }

    /// Write a 10-bit DAC code: bits 9..8 to MSB, then bits 7..0 to LSB.
    fn write_code(&self, bus: &mut dyn RegisterBus, code: u16) -> Result<()> {
        write_byte(bus, REG_VCM_CODE_MSB, ((code & 0x0300) >> 8) as u8)?;
        write_byte(bus, REG_VCM_CODE_LSB, (code & 0x00FF) as u8)
    }
}

fn ov5693_lens() -> LensInfo {
    LensInfo {
        focal_length: Rational::new(46, 10),
        f_number: Rational::new(265, 100),
        pixel_size: Rational::new(14, 10),
        total_focus_distance: Rational::new(197_681, 1000),
    }
}

/// OV5693 module VCM.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ov5693;

impl Ov5693 {
    pub const ADDRESS: u16 = 0x1C;
    pub const TOTAL_STEPS: u16 = 52;
}

impl ActuatorModel for Ov5693 {
    fn name(&self) -> &'static str {
        "ov5693"
    }

    fn i2c_address(&self) -> u16 {
        Self::ADDRESS
    }

    fn default_params(&self) -> ActuatorParams {
        // Device-tuned: two coarse steps of 32 codes, then 16 per step.
        let regions = RegionMap::new(vec![
            RegionBoundary::new(2, 32),
            RegionBoundary::new(Self::TOTAL_STEPS, 16),
        ])
        .unwrap_or_else(|_| RegionMap::uniform(16));
        ActuatorParams {
            initial_code: 0,
            total_steps: Self::TOTAL_STEPS,
            max_code: DAC_MAX_CODE,
            gross_steps: 3,
            fine_steps: 1,
            regions,
            ringing: RingingParams::default(),
        }
    }

    fn lens_info(&self) -> LensInfo {
        ov5693_lens()
    }
}

/// OV5693 VCM driven by the rawchip AF engine: many small uniform steps.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ov5693Rawchip;

impl Ov5693Rawchip {
    pub const TOTAL_STEPS: u16 = 256;
}

impl ActuatorModel for Ov5693Rawchip {
    fn name(&self) -> &'static str {
        "ov5693-rawchip"
    }

    fn i2c_address(&self) -> u16 {
        Ov5693::ADDRESS
    }

    fn default_params(&self) -> ActuatorParams {
        ActuatorParams {
            initial_code: 0,
            total_steps: Self::TOTAL_STEPS,
            max_code: DAC_MAX_CODE,
            gross_steps: 3,
            fine_steps: 1,
            regions: RegionMap::uniform(4),
            ringing: RingingParams::default(),
        }
    }

    fn lens_info(&self) -> LensInfo {
        ov5693_lens()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_hardware::SimulatedBus;

    #[test]
    fn code_split_is_bit_exact() {
        let bus = SimulatedBus::new();
        let mut b = bus.clone();
        Ov5693.write_code(&mut b, 0x2F5).unwrap();
        let w: Vec<(u16, u16)> = bus.writes().iter().map(|w| (w.reg, w.value)).collect();
        assert_eq!(w, vec![(REG_VCM_CODE_MSB, 0x02), (REG_VCM_CODE_LSB, 0xF5)]);
    }

    #[test]
    fn msb_failure_skips_lsb() {
        let bus = SimulatedBus::new().fail_register(REG_VCM_CODE_MSB);
        let mut b = bus.clone();
        assert!(Ov5693.write_code(&mut b, 0x100).is_err());
        assert_eq!(bus.attempts(), 1);
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn default_params_are_valid() {
        Ov5693.default_params().validate().unwrap();
        Ov5693Rawchip.default_params().validate().unwrap();
    }
}
