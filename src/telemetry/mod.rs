//! Telemetry collector and helpers.
//!
//! The collector keeps a bounded history of control-loop metrics and fans
//! them out over a broadcast channel. Publishing never blocks the loop: a
//! lagging subscriber loses events, the loop does not wait for it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;

use crate::engine::CycleReport;
use crate::error::{ControlError, ErrorCode};

pub mod events;

pub use events::{LifecyclePhase, MetricEvent};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    tx: broadcast::Sender<MetricEvent>,
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut history) = self.history.lock() {
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let recent = self
            .history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default();
        TelemetrySnapshot {
            recent,
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Rolling window over cycle durations to compute avg/max.
struct CycleTimingTracker {
    samples: VecDeque<f32>,
    max_samples: usize,
}

impl CycleTimingTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    fn observe(&mut self, value_ms: f32) -> (f32, f32, usize) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value_ms.abs());

        let count = self.samples.len();
        let sum: f32 = self.samples.iter().copied().sum();
        let max = self
            .samples
            .iter()
            .copied()
            .fold(0.0_f32, |acc, next| acc.max(next));
        let avg = if count == 0 { 0.0 } else { sum / count as f32 };
        (avg, max, count)
    }
}

/// Control-loop telemetry: collector plus derived cycle timing gauge.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    timing: Mutex<CycleTimingTracker>,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, timing_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            timing: Mutex::new(CycleTimingTracker::new(timing_window)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetricEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    /// Record one finished cycle, its transition if any, and its duration
    pub fn record_cycle(&self, report: &CycleReport, elapsed: Duration) {
        self.collector.publish(MetricEvent::Cycle {
            cycle: report.cycle,
            peak_hz: report.peak_hz,
            tone: report.tone,
            level: report.level,
            stability_count: report.stability_count,
        });

        if let Some(transition) = report.transition {
            self.collector.publish(MetricEvent::Transition {
                cycle: report.cycle,
                from: transition.from,
                to: transition.to,
                duty: report.duty,
            });
        }

        let timing = self
            .timing
            .lock()
            .map(|mut tracker| tracker.observe(elapsed.as_secs_f32() * 1000.0));
        if let Ok((avg_ms, max_ms, sample_count)) = timing {
            self.collector.publish(MetricEvent::CycleTiming {
                avg_ms,
                max_ms,
                sample_count,
            });
        }
    }

    pub fn record_phase(&self, phase: LifecyclePhase) {
        self.collector.publish(MetricEvent::Lifecycle {
            phase,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_error(&self, err: &ControlError, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code: err.code(),
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 32)
    }
}

fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Tone;
    use crate::control::Transition;

    fn sample_report(cycle: u64, transition: Option<Transition>) -> CycleReport {
        CycleReport {
            cycle,
            peak_hz: 440.2,
            suppressed_peak_hz: 440.2,
            tone: Tone::TargetHigh,
            stable: Some(true),
            stability_count: 0,
            level: 1,
            level_label: "Half".to_string(),
            duty: 135,
            transition,
        }
    }

    #[test]
    fn collector_preserves_order_within_history() {
        let collector = TelemetryCollector::new(8, 3);
        collector.publish(MetricEvent::CycleTiming {
            avg_ms: 1.0,
            max_ms: 2.0,
            sample_count: 1,
        });
        collector.publish(MetricEvent::Lifecycle {
            phase: LifecyclePhase::LoopStarted,
            timestamp_ms: 5,
        });

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::CycleTiming { .. }
        ));
        assert!(matches!(
            snapshot.recent[1],
            MetricEvent::Lifecycle {
                phase: LifecyclePhase::LoopStarted,
                ..
            }
        ));
    }

    #[test]
    fn collector_drops_history_when_full() {
        let collector = TelemetryCollector::new(8, 2);
        for code in 1..=3 {
            collector.publish(MetricEvent::Error {
                code,
                context: "test".to_string(),
            });
        }

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
        assert!(matches!(snapshot.recent[0], MetricEvent::Error { code: 2, .. }));
    }

    #[test]
    fn hub_emits_transition_only_when_fired() {
        let hub = TelemetryHub::new(16, 16, 4);
        hub.record_cycle(&sample_report(1, None), Duration::from_millis(70));
        hub.record_cycle(
            &sample_report(6, Some(Transition { from: 0, to: 1 })),
            Duration::from_millis(66),
        );

        let snapshot = hub.snapshot();
        let transitions: Vec<&MetricEvent> = snapshot
            .recent
            .iter()
            .filter(|event| matches!(event, MetricEvent::Transition { .. }))
            .collect();
        assert_eq!(transitions.len(), 1);
        assert!(matches!(
            transitions[0],
            MetricEvent::Transition {
                cycle: 6,
                from: 0,
                to: 1,
                duty: 135
            }
        ));
    }

    #[test]
    fn cycle_timing_tracks_rolling_max() {
        let hub = TelemetryHub::new(16, 16, 2);
        hub.record_cycle(&sample_report(1, None), Duration::from_millis(90));
        hub.record_cycle(&sample_report(2, None), Duration::from_millis(60));
        hub.record_cycle(&sample_report(3, None), Duration::from_millis(70));

        let last_timing = hub
            .snapshot()
            .recent
            .into_iter()
            .rev()
            .find_map(|event| match event {
                MetricEvent::CycleTiming {
                    max_ms,
                    sample_count,
                    ..
                } => Some((max_ms, sample_count)),
                _ => None,
            })
            .unwrap();
        // The 90 ms cycle has left the two-sample window
        assert_eq!(last_timing.1, 2);
        assert!((last_timing.0 - 70.0).abs() < 0.01);
    }

    #[test]
    fn subscriber_receives_published_events() {
        let hub = TelemetryHub::default();
        let mut rx = hub.subscribe();
        hub.record_phase(LifecyclePhase::Halted);

        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event,
            MetricEvent::Lifecycle {
                phase: LifecyclePhase::Halted,
                ..
            }
        ));
    }

    #[test]
    fn error_events_carry_codes() {
        let hub = TelemetryHub::default();
        let err = ControlError::PeripheralMissing {
            peripheral: "RTC".to_string(),
        };
        hub.record_error(&err, "preflight");

        let snapshot = hub.snapshot();
        assert!(matches!(
            snapshot.recent[0],
            MetricEvent::Error { code: 3002, .. }
        ));
    }
}
