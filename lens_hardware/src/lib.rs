pub mod error;
pub mod util;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod linux;

pub use error::HwError;

use lens_traits::{DataWidth, PowerControl, RegisterBus};
use std::sync::{Arc, Mutex, MutexGuard};

/// One register write observed by [`SimulatedBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub reg: u16,
    pub value: u16,
    pub width: DataWidth,
}

#[derive(Debug, Default)]
struct SimBusState {
    writes: Vec<BusWrite>,
    attempts: usize,
    fail_at: Option<usize>,
    fail_reg: Option<u16>,
}

/// Simulated register bus.
///
/// Clones share the same write log, so a test can keep a handle while the
/// actuator owns another. Failed writes are not recorded in the log.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    state: Arc<Mutex<SimBusState>>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th write attempt (1-based) with a NACK.
    pub fn fail_at_write(self, n: usize) -> Self {
        self.lock().fail_at = Some(n);
        self
    }

    /// Fail every write to `reg` with a NACK.
    pub fn fail_register(self, reg: u16) -> Self {
        self.lock().fail_reg = Some(reg);
        self
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        let mut st = self.lock();
        st.fail_at = None;
        st.fail_reg = None;
    }

    /// Successful writes so far, in order.
    pub fn writes(&self) -> Vec<BusWrite> {
        self.lock().writes.clone()
    }

    /// Number of write attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    pub fn clear(&self) {
        let mut st = self.lock();
        st.writes.clear();
        st.attempts = 0;
    }

    fn lock(&self) -> MutexGuard<'_, SimBusState> {
        // A panic while holding the log only happens in a failing test.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl RegisterBus for SimulatedBus {
    fn write(
        &mut self,
        reg: u16,
        value: u16,
        width: DataWidth,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = self.lock();
        st.attempts += 1;
        if st.fail_at == Some(st.attempts) || st.fail_reg == Some(reg) {
            tracing::debug!(reg, value, "simulated nack");
            return Err(Box::new(HwError::Nack { reg }));
        }
        if value > width.max_value() {
            return Err(Box::new(HwError::Bus(format!(
                "value 0x{value:04x} does not fit {width:?} write to 0x{reg:04x}"
            ))));
        }
        tracing::trace!(reg, value, "simulated register write");
        st.writes.push(BusWrite { reg, value, width });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct SimPowerState {
    on: bool,
    transitions: Vec<bool>,
    fail_on: bool,
}

/// Simulated actuator enable line.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPower {
    state: Arc<Mutex<SimPowerState>>,
}

impl SimulatedPower {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `power_on` request fail.
    pub fn failing_on(self) -> Self {
        self.lock().fail_on = true;
        self
    }

    pub fn is_on(&self) -> bool {
        self.lock().on
    }

    /// Levels driven so far (`true` = enabled).
    pub fn transitions(&self) -> Vec<bool> {
        self.lock().transitions.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimPowerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl PowerControl for SimulatedPower {
    fn power_on(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = self.lock();
        if st.fail_on {
            return Err(Box::new(HwError::Gpio("enable line request failed".into())));
        }
        st.on = true;
        st.transitions.push(true);
        tracing::debug!("actuator enable line high (simulated)");
        Ok(())
    }

    fn power_off(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut st = self.lock();
        st.on = false;
        st.transitions.push(false);
        tracing::debug!("actuator enable line low (simulated)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_bus_records_in_order() {
        let mut bus = SimulatedBus::new();
        let handle = bus.clone();
        bus.write(0x03, 0x01, DataWidth::Byte).unwrap();
        bus.write(0x04, 0xF4, DataWidth::Byte).unwrap();
        let w = handle.writes();
        assert_eq!(w.len(), 2);
        assert_eq!((w[0].reg, w[0].value), (0x03, 0x01));
        assert_eq!((w[1].reg, w[1].value), (0x04, 0xF4));
    }

    #[test]
    fn simulated_bus_fails_requested_attempt_only() {
        let mut bus = SimulatedBus::new().fail_at_write(2);
        assert!(bus.write(0x03, 0, DataWidth::Byte).is_ok());
        assert!(bus.write(0x04, 0, DataWidth::Byte).is_err());
        assert!(bus.write(0x04, 0, DataWidth::Byte).is_ok());
        assert_eq!(bus.attempts(), 3);
        assert_eq!(bus.writes().len(), 2);
    }

    #[test]
    fn simulated_bus_rejects_oversized_byte() {
        let mut bus = SimulatedBus::new();
        let err = bus.write(0x04, 0x1FF, DataWidth::Byte).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn simulated_power_tracks_level() {
        let mut p = SimulatedPower::new();
        p.power_on().unwrap();
        assert!(p.is_on());
        p.power_off().unwrap();
        assert!(!p.is_on());
        assert_eq!(p.transitions(), vec![true, false]);
    }
}
