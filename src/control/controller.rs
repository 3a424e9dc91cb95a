// SpeedController - the per-cycle hysteresis/debounce state machine
//
// Per cycle, given the classified tone and its (suppressed) peak:
// 1. Stability: the peak is within `tolerance_hz` of the previous peak.
// 2. Counting: a target reading that agrees with the previous peak (or is
//    the first reading ever) extends the run; one that disagrees resets it.
//    A no-tone reading follows the configured `NonePolicy`.
// 3. Firing: the run must exceed the threshold, the reading must be stable
//    against an actual previous peak, and the level must have room to move.
//    A fired step moves exactly one level and resets the run.
// 4. The peak is remembered for the next comparison regardless.

use serde::{Deserialize, Serialize};

use super::state::{ControlState, SpeedLevels};
use crate::analysis::Tone;
use crate::config::ControllerConfig;

/// Effect of a no-tone cycle on the stability count
///
/// The policy only changes the count reported for the silent cycle. Its
/// suppressed 0 Hz peak becomes `previous_peak` under both policies, so the
/// next target reading is unstable and restarts the run either way. Both
/// policies fire the same transitions whenever `tolerance_hz` is below the
/// lowest band frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonePolicy {
    /// Silence breaks the run
    #[default]
    Reset,
    /// Silence leaves the count untouched
    Hold,
}

/// A fired level change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
}

/// Outcome of one controller step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub tone: Tone,
    /// Peak used for the stability comparison (0 Hz when no tone)
    pub peak_hz: f32,
    /// `None` on the very first cycle, when there is nothing to compare with
    pub stable: Option<bool>,
    pub stability_count: u32,
    pub transition: Option<Transition>,
}

/// Debounced hysteresis controller over an ordered level table
#[derive(Debug, Clone)]
pub struct SpeedController {
    levels: SpeedLevels,
    tolerance_hz: f32,
    debounce_threshold: u32,
    start_stop_threshold: u32,
    none_policy: NonePolicy,
}

impl SpeedController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            levels: SpeedLevels::new(config.levels.clone()),
            tolerance_hz: config.tolerance_hz,
            debounce_threshold: config.debounce_threshold,
            start_stop_threshold: config
                .start_stop_threshold
                .unwrap_or(config.debounce_threshold),
            none_policy: config.none_policy,
        }
    }

    pub fn levels(&self) -> &SpeedLevels {
        &self.levels
    }

    /// `|peak - previous| <= tolerance`
    pub fn is_stable(&self, peak_hz: f32, previous_hz: f32) -> bool {
        previous_hz - self.tolerance_hz <= peak_hz && peak_hz <= previous_hz + self.tolerance_hz
    }

    /// Advance the state machine by one cycle
    pub fn step(&self, state: &mut ControlState, tone: Tone, peak_hz: f32) -> Decision {
        let peak_hz = if tone.is_target() { peak_hz } else { 0.0 };
        let stable = state
            .previous_peak
            .map(|previous| self.is_stable(peak_hz, previous));
        let mut transition = None;

        if tone.is_target() {
            if stable == Some(false) {
                state.stability_count = 0;
            } else {
                state.stability_count = state.stability_count.saturating_add(1);
            }

            if stable == Some(true) {
                if let Some(to) = self.neighbour(state.current_level, tone) {
                    let threshold = self.threshold_for(state.current_level, to);
                    if state.stability_count > threshold {
                        transition = Some(Transition {
                            from: state.current_level,
                            to,
                        });
                        state.current_level = to;
                        state.stability_count = 0;
                    }
                }
            }
        } else if self.none_policy == NonePolicy::Reset {
            state.stability_count = 0;
        }

        state.previous_peak = Some(peak_hz);

        Decision {
            tone,
            peak_hz,
            stable,
            stability_count: state.stability_count,
            transition,
        }
    }

    /// Adjacent level in the tone's direction, if there is room to move
    fn neighbour(&self, current: usize, tone: Tone) -> Option<usize> {
        match tone {
            Tone::TargetHigh if current < self.levels.max_index() => Some(current + 1),
            Tone::TargetLow if current > 0 => Some(current - 1),
            _ => None,
        }
    }

    /// Starting from or stopping to Off may use its own threshold
    fn threshold_for(&self, from: usize, to: usize) -> u32 {
        if from == 0 || to == 0 {
            self.start_stop_threshold
        } else {
            self.debounce_threshold
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
