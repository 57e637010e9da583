//! Focus direction and destination clamping.

use std::str::FromStr;

use crate::error::ActuatorError;

/// Raw direction code for moving toward macro.
pub const MOVE_NEAR: i32 = 0;
/// Raw direction code for moving toward infinity.
pub const MOVE_FAR: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Toward macro; increases the step index.
    Near,
    /// Toward infinity; decreases the step index.
    Far,
}

impl Direction {
    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Direction::Near => 1,
            Direction::Far => -1,
        }
    }
}

impl TryFrom<i32> for Direction {
    type Error = ActuatorError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            MOVE_NEAR => Ok(Direction::Near),
            MOVE_FAR => Ok(Direction::Far),
            other => Err(ActuatorError::InvalidArgument(format!(
                "illegal focus direction {other}"
            ))),
        }
    }
}

impl FromStr for Direction {
    type Err = ActuatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "near" | "n" | "+" => Ok(Direction::Near),
            "far" | "f" | "-" => Ok(Direction::Far),
            other => Err(ActuatorError::InvalidArgument(format!(
                "illegal focus direction {other:?}"
            ))),
        }
    }
}

/// Current lens position: step index and the code last written for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusState {
    pub step: u16,
    pub code: u16,
}

/// `current + sign * num_steps`, clamped to `[0, total_steps]`.
#[inline]
pub fn destination(current: u16, dir: Direction, num_steps: i32, total_steps: u16) -> u16 {
    let dest = i64::from(current) + dir.sign() * i64::from(num_steps);
    dest.clamp(0, i64::from(total_steps)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_map_to_directions() {
        assert_eq!(Direction::try_from(MOVE_NEAR), Ok(Direction::Near));
        assert_eq!(Direction::try_from(MOVE_FAR), Ok(Direction::Far));
        assert!(matches!(
            Direction::try_from(7),
            Err(ActuatorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn parses_names() {
        assert_eq!("NEAR".parse::<Direction>(), Ok(Direction::Near));
        assert_eq!(" far ".parse::<Direction>(), Ok(Direction::Far));
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn destination_clamps_both_ends() {
        assert_eq!(destination(0, Direction::Far, 5, 52), 0);
        assert_eq!(destination(50, Direction::Near, 5, 52), 52);
        assert_eq!(destination(10, Direction::Near, 3, 52), 13);
        assert_eq!(destination(10, Direction::Near, -3, 52), 7);
        assert_eq!(destination(0, Direction::Near, i32::MAX, 52), 52);
        assert_eq!(destination(52, Direction::Far, i32::MIN, 52), 52);
    }
}
