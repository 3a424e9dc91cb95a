//! Engine module wiring the control cycle together.
//!
//! `core` holds the [`ControlLoop`]; `preflight` holds the startup peripheral
//! probe and the fatal halt path.

pub mod core;
mod preflight;

pub use core::{ControlLoop, CycleReport, Hardware};
pub use preflight::{halt, preflight, Peripheral};
