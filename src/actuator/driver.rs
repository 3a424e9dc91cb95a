// H-bridge motor driver glue
//
// One PWM-capable enable output sets the speed, two digital inputs of the
// bridge select the direction (A high / B low spins forward).

use super::{Actuator, Direction};

/// PWM-capable output pin (0-255 duty)
pub trait DutyOutput: Send {
    fn write_duty(&mut self, duty: u8);
}

/// Push-pull digital output pin
pub trait DigitalOutput: Send {
    fn set_level(&mut self, high: bool);
}

/// [`Actuator`] over an enable pin plus two direction pins
pub struct MotorDriver<E, A, B> {
    enable: E,
    dir_a: A,
    dir_b: B,
}

impl<E, A, B> MotorDriver<E, A, B>
where
    E: DutyOutput,
    A: DigitalOutput,
    B: DigitalOutput,
{
    pub fn new(enable: E, dir_a: A, dir_b: B) -> Self {
        Self {
            enable,
            dir_a,
            dir_b,
        }
    }

    pub fn into_parts(self) -> (E, A, B) {
        (self.enable, self.dir_a, self.dir_b)
    }
}

impl<E, A, B> Actuator for MotorDriver<E, A, B>
where
    E: DutyOutput,
    A: DigitalOutput,
    B: DigitalOutput,
{
    fn set_speed(&mut self, duty: u8) {
        self.enable.write_duty(duty);
    }

    fn set_direction(&mut self, direction: Direction) {
        let forward = direction == Direction::Forward;
        self.dir_a.set_level(forward);
        self.dir_b.set_level(!forward);
    }
}
