// Control state - the persistent per-process controller memory

use serde::{Deserialize, Serialize};

use crate::actuator::Direction;
use crate::config::LevelConfig;

/// Ordered table of discrete speed levels
///
/// Index 0 is always Off. The controller only moves between adjacent
/// indices; the duty written to the motor is a separate lookup so the step
/// logic never depends on the PWM encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedLevels {
    levels: Vec<LevelConfig>,
}

impl SpeedLevels {
    /// Build a level table; callers validate the table through `AppConfig::validate`
    pub fn new(levels: Vec<LevelConfig>) -> Self {
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the fastest level
    pub fn max_index(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.levels.len()
    }

    /// PWM duty for a level index (0 for out-of-range indices)
    pub fn duty(&self, index: usize) -> u8 {
        self.levels.get(index).map(|level| level.duty).unwrap_or(0)
    }

    pub fn label(&self, index: usize) -> &str {
        self.levels
            .get(index)
            .map(|level| level.label.as_str())
            .unwrap_or("?")
    }
}

/// Controller state carried from one cycle to the next
///
/// Created once at startup and mutated exactly once per cycle by
/// [`SpeedController::step`](super::SpeedController::step).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlState {
    /// Index into the speed level table
    pub current_level: usize,
    /// Consecutive agreeing target readings since the last reset
    pub stability_count: u32,
    /// Last cycle's peak after suppression; `None` before the first cycle
    pub previous_peak: Option<f32>,
    /// Spin direction, fixed at startup
    pub direction: Direction,
}

impl ControlState {
    pub fn new(direction: Direction) -> Self {
        Self {
            current_level: 0,
            stability_count: 0,
            previous_peak: None,
            direction,
        }
    }

    /// State parked at a given level, as if the controller had just stepped there
    pub fn at_level(level: usize, direction: Direction) -> Self {
        Self {
            current_level: level,
            ..Self::new(direction)
        }
    }
}
