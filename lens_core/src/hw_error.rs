//! Maps `Box<dyn Error>` from trait boundaries to typed `ActuatorError`.
//!
//! The traits in `lens_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `lens_hardware::HwError` downcasting.

use crate::error::ActuatorError;

/// Map a trait-boundary error to a typed `ActuatorError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + Send + Sync + 'static)) -> ActuatorError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<lens_hardware::HwError>() {
            return match hw {
                lens_hardware::HwError::Gpio(_) => ActuatorError::Power(hw.to_string()),
                other => ActuatorError::Io(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("gpio") {
        ActuatorError::Power(s)
    } else {
        ActuatorError::Io(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_errors_become_io() {
        let e: Box<dyn std::error::Error + Send + Sync> = "i2c write nack".into();
        assert_eq!(
            map_hw_error(e.as_ref()),
            ActuatorError::Io("i2c write nack".into())
        );
    }

    #[test]
    fn gpio_text_becomes_power() {
        let e: Box<dyn std::error::Error + Send + Sync> = "gpio 17 busy".into();
        assert!(matches!(map_hw_error(e.as_ref()), ActuatorError::Power(_)));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_are_downcast() {
        let nack: Box<dyn std::error::Error + Send + Sync> =
            Box::new(lens_hardware::HwError::Nack { reg: 0x03 });
        assert!(matches!(map_hw_error(nack.as_ref()), ActuatorError::Io(m) if m.contains("0x0003")));
        let gpio: Box<dyn std::error::Error + Send + Sync> =
            Box::new(lens_hardware::HwError::Gpio("busy".into()));
        assert!(matches!(map_hw_error(gpio.as_ref()), ActuatorError::Power(_)));
    }
}
