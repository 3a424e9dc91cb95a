// Tone Drive - acoustic tone triggered motor controller
// Fixed-rate sampling, FFT peak detection and a debounced speed state machine

// Module declarations
pub mod actuator;
pub mod analysis;
pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod sampling;
pub mod status;
pub mod telemetry;
pub mod testing;

pub use config::AppConfig;
pub use engine::{ControlLoop, CycleReport, Hardware};
pub use error::{ControlError, ErrorCode};

/// Install the stderr fmt subscriber; `RUST_LOG` picks the level.
///
/// Records emitted through the `log` facade are bridged as well. Calling it
/// twice is harmless.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_structure() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_logging();
        init_logging();
    }
}
