//! Linux I2C register bus and GPIO enable line (rppal).

use std::time::Duration;

use lens_traits::{DataWidth, PowerControl, RegisterBus, ThreadDelay};
use rppal::gpio::{Gpio, OutputPin};
use rppal::i2c::I2c;
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::with_retries;

/// Register address width on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrWidth {
    Byte,
    Word,
}

pub struct I2cRegisterBus {
    i2c: I2c,
    addr_width: AddrWidth,
    retries: u32,
    retry_pause: Duration,
}

impl I2cRegisterBus {
    /// Open `/dev/i2c-<bus>` and address the peripheral at `address` (7-bit).
    pub fn open(bus: u8, address: u16, addr_width: AddrWidth, retries: u32) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::Bus(format!("open i2c-{bus}: {e}")))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::Bus(format!("set address 0x{address:02x}: {e}")))?;
        debug!(bus, address, ?addr_width, retries, "i2c register bus ready");
        Ok(Self {
            i2c,
            addr_width,
            retries: retries.max(1),
            retry_pause: Duration::from_millis(1),
        })
    }

    fn frame(&self, reg: u16, value: u16, width: DataWidth) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4);
        match self.addr_width {
            AddrWidth::Byte => buf.push(reg as u8),
            AddrWidth::Word => buf.extend_from_slice(&reg.to_be_bytes()),
        }
        match width {
            DataWidth::Byte => buf.push(value as u8),
            DataWidth::Word => buf.extend_from_slice(&value.to_be_bytes()),
        }
        buf
    }
}

impl RegisterBus for I2cRegisterBus {
    fn write(
        &mut self,
        reg: u16,
        value: u16,
        width: DataWidth,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if value > width.max_value() {
            return Err(Box::new(HwError::Bus(format!(
                "value 0x{value:04x} does not fit {width:?} write"
            ))));
        }
        let buf = self.frame(reg, value, width);
        let (retries, pause) = (self.retries, self.retry_pause);
        let i2c = &mut self.i2c;
        with_retries(retries, pause, &ThreadDelay, || match i2c.write(&buf) {
            Ok(n) if n == buf.len() => Ok(()),
            Ok(_) => Err(HwError::Nack { reg }),
            Err(e) => Err(HwError::Bus(e.to_string())),
        })?;
        trace!(reg, value, "i2c register write");
        Ok(())
    }
}

/// Actuator enable (power-down) pin driven as a plain output.
pub struct GpioPower {
    pin: OutputPin,
}

impl GpioPower {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("request gpio {pin}: {e}")))?
            .into_output_low();
        Ok(Self { pin })
    }
}

impl PowerControl for GpioPower {
    fn power_on(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin.set_high();
        debug!(pin = self.pin.pin(), "actuator enable line high");
        Ok(())
    }

    fn power_off(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.pin.set_low();
        debug!(pin = self.pin.pin(), "actuator enable line low");
        Ok(())
    }
}
