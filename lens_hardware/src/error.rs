use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("bus error: {0}")]
    Bus(String),
    #[error("no ack writing register 0x{reg:04x}")]
    Nack { reg: u16 },
    #[error("gpio error: {0}")]
    Gpio(String),
}

pub type Result<T> = std::result::Result<T, HwError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_resource() {
        assert_eq!(
            HwError::Nack { reg: 0x04 }.to_string(),
            "no ack writing register 0x0004"
        );
        assert!(HwError::Gpio("pin 17 busy".into()).to_string().starts_with("gpio"));
        assert!(HwError::Bus("open i2c-1".into()).to_string().contains("i2c-1"));
    }
}
