//! Capability traits for the lens actuator stack.
//!
//! The core never talks to a bus or a GPIO line directly; everything goes
//! through these traits so the same control logic runs against simulated
//! devices in tests and real hardware on the target.

pub mod delay;

pub use delay::{Delay, ThreadDelay};

/// Payload width of a single register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataWidth {
    Byte,
    Word,
}

impl DataWidth {
    /// Largest value representable at this width.
    #[inline]
    pub fn max_value(self) -> u16 {
        match self {
            DataWidth::Byte => 0x00FF,
            DataWidth::Word => 0xFFFF,
        }
    }
}

/// Synchronous register write access to an addressed peripheral.
pub trait RegisterBus {
    fn write(
        &mut self,
        reg: u16,
        value: u16,
        width: DataWidth,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Enable line of the actuator driver.
pub trait PowerControl {
    fn power_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn power_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for Box<T> {
    fn write(
        &mut self,
        reg: u16,
        value: u16,
        width: DataWidth,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write(reg, value, width)
    }
}

impl<T: PowerControl + ?Sized> PowerControl for Box<T> {
    fn power_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).power_on()
    }
    fn power_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).power_off()
    }
}
