use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use super::{Actuator, Direction};

/// Observable state of a [`SimulatedMotor`]
#[derive(Debug, Default)]
pub struct SimulatedMotorState {
    duty: AtomicU8,
    direction: AtomicU8,
    speed_writes: AtomicU64,
    direction_writes: AtomicU64,
}

impl SimulatedMotorState {
    pub fn duty(&self) -> u8 {
        self.duty.load(Ordering::SeqCst)
    }

    pub fn direction(&self) -> Direction {
        Direction::from_bits(self.direction.load(Ordering::SeqCst))
    }

    pub fn speed_writes(&self) -> u64 {
        self.speed_writes.load(Ordering::SeqCst)
    }

    pub fn direction_writes(&self) -> u64 {
        self.direction_writes.load(Ordering::SeqCst)
    }
}

/// Motor stand-in for desktop runs and tests
///
/// Writes land in atomics shared with whoever holds [`SimulatedMotor::state`],
/// so the control loop can own the actuator while a test inspects it.
#[derive(Debug, Default)]
pub struct SimulatedMotor {
    state: Arc<SimulatedMotorState>,
}

impl SimulatedMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<SimulatedMotorState> {
        Arc::clone(&self.state)
    }
}

impl Actuator for SimulatedMotor {
    fn set_speed(&mut self, duty: u8) {
        self.state.duty.store(duty, Ordering::SeqCst);
        self.state.speed_writes.fetch_add(1, Ordering::SeqCst);
        log::debug!("[SimulatedMotor] duty={}", duty);
    }

    fn set_direction(&mut self, direction: Direction) {
        self.state
            .direction
            .store(direction.to_bits(), Ordering::SeqCst);
        self.state.direction_writes.fetch_add(1, Ordering::SeqCst);
        log::debug!("[SimulatedMotor] direction={}", direction.label());
    }
}
