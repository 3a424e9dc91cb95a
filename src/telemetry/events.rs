//! Metric event types emitted by the control loop.

use serde::{Deserialize, Serialize};

use crate::analysis::Tone;

/// Lifecycle stages of the control loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    PreflightPassed,
    DirectionSet,
    LoopStarted,
    Halted,
}

/// Metric events covering per-cycle readings, transitions and lifecycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Cycle {
        cycle: u64,
        peak_hz: f32,
        tone: Tone,
        level: usize,
        stability_count: u32,
    },
    Transition {
        cycle: u64,
        from: usize,
        to: usize,
        duty: u8,
    },
    CycleTiming {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    Lifecycle {
        phase: LifecyclePhase,
        timestamp_ms: u64,
    },
    Error {
        code: i32,
        context: String,
    },
}
