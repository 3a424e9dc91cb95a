//! Status board shared with the display path
//!
//! The control loop is the only writer; an asynchronous reader (a display
//! refresh timer) may sample it at any moment. Every exposed field is one
//! atomic store, and labels/duties are looked up from an immutable table, so
//! a reader never sees a half-written value. A snapshot taken mid-publish
//! can mix fields from two consecutive cycles, which the display tolerates.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::actuator::Direction;
use crate::control::SpeedLevels;

/// Copy of the published status, owned by the reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub level: usize,
    pub level_label: String,
    pub duty: u8,
    pub direction: Direction,
    pub cycle: u64,
}

impl StatusSnapshot {
    /// Two-field text the display renders
    pub fn status_line(&self) -> String {
        format!(
            "Speed: {} ({})  Dir: {}",
            self.level_label,
            self.duty,
            self.direction.label()
        )
    }
}

/// Single-writer, multi-reader status cell
pub struct StatusBoard {
    levels: SpeedLevels,
    level: AtomicUsize,
    direction: AtomicU8,
    cycle: AtomicU64,
}

impl StatusBoard {
    pub fn new(levels: SpeedLevels, direction: Direction) -> Self {
        Self {
            levels,
            level: AtomicUsize::new(0),
            direction: AtomicU8::new(direction.to_bits()),
            cycle: AtomicU64::new(0),
        }
    }

    /// Publish the end-of-cycle state
    pub fn publish(&self, level: usize, direction: Direction, cycle: u64) {
        self.level.store(level, Ordering::Release);
        self.direction.store(direction.to_bits(), Ordering::Release);
        self.cycle.store(cycle, Ordering::Release);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let level = self.level.load(Ordering::Acquire);
        StatusSnapshot {
            level,
            level_label: self.levels.label(level).to_string(),
            duty: self.levels.duty(level),
            direction: Direction::from_bits(self.direction.load(Ordering::Acquire)),
            cycle: self.cycle.load(Ordering::Acquire),
        }
    }
}
