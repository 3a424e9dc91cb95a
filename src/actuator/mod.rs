//! Actuator boundary - motor speed and direction outputs
//!
//! The control loop talks to the motor through [`Actuator`] only. Both
//! operations are idempotent, immediate and infallible: a write either
//! lands on the pins or the hardware is gone, and the loop cannot tell.

use serde::{Deserialize, Serialize};

mod driver;
mod simulated;

pub use driver::{DigitalOutput, DutyOutput, MotorDriver};
pub use simulated::{SimulatedMotor, SimulatedMotorState};

/// Motor spin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Forward => "Forward",
            Direction::Reverse => "Reverse",
        }
    }

    pub(crate) fn to_bits(self) -> u8 {
        match self {
            Direction::Forward => 0,
            Direction::Reverse => 1,
        }
    }

    pub(crate) fn from_bits(bits: u8) -> Self {
        if bits == 1 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// Motor output consumed by the control loop
///
/// `set_direction` is called once at startup, `set_speed` only when the
/// controller fires a transition.
pub trait Actuator: Send {
    /// Write a PWM duty (0 = stopped, 255 = full)
    fn set_speed(&mut self, duty: u8);

    fn set_direction(&mut self, direction: Direction);
}
