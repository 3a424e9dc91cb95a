// Control module - debounced hysteresis speed controller
//
// Turns the stream of classified peak readings into discrete speed level
// changes. A level only moves after the same tone has been heard, within a
// frequency tolerance, for more than `debounce_threshold` consecutive cycles,
// and then only to an adjacent level.

mod controller;
mod state;

pub use controller::{Decision, NonePolicy, SpeedController, Transition};
pub use state::{ControlState, SpeedLevels};
