use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tone_drive::actuator::SimulatedMotor;
use tone_drive::analysis::{SpectralAnalyzer, Tone, ToneClassifier};
use tone_drive::config::AppConfig;
use tone_drive::engine::{halt, ControlLoop, Hardware};
use tone_drive::sampling::SampleBuffer;
use tone_drive::telemetry::TelemetryHub;
use tone_drive::testing::{
    parse_schedule, ScheduledToneInput, SimulatedPeripheral, ToneGenerator, VirtualClock,
};

#[derive(Parser, Debug)]
#[command(
    name = "tone_drive_cli",
    about = "Desktop harness for the tone-driven motor controller"
)]
struct Cli {
    /// JSON configuration file (defaults are used when absent or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the control loop against a synthetic tone schedule
    Simulate {
        /// Comma-separated HZ:CYCLES steps, 0 Hz is silence
        #[arg(long)]
        schedule: String,
        /// Uniform noise amplitude in ADC counts
        #[arg(long, default_value_t = 0.0)]
        noise: f32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Cycles to run (defaults to the schedule length)
        #[arg(long)]
        cycles: Option<u64>,
        /// Pretend the RTC is absent: report and halt forever
        #[arg(long)]
        missing_rtc: bool,
        /// Keep running after the schedule ends, until killed
        #[arg(long, conflicts_with = "cycles")]
        forever: bool,
    },
    /// Peak-detect and classify every N-sample block of a WAV file
    Analyze {
        #[arg(long)]
        wav: PathBuf,
    },
    /// Classify a single frequency
    Classify {
        #[arg(long)]
        hz: f32,
    },
    /// Print the effective configuration as JSON
    DumpConfig,
}

#[derive(Serialize)]
struct BlockReport {
    block: usize,
    start_sample: usize,
    peak_hz: f32,
    magnitude: f32,
    tone: Tone,
    suppressed_peak_hz: f32,
}

#[derive(Serialize)]
struct ClassifyReport {
    hz: f32,
    tone: Tone,
    suppressed_peak_hz: f32,
}

fn main() -> ExitCode {
    tone_drive::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };
    config.validate().context("validating configuration")?;

    match cli.command {
        Commands::Simulate {
            schedule,
            noise,
            seed,
            cycles,
            missing_rtc,
            forever,
        } => {
            let options = SimulateOptions {
                noise,
                seed,
                cycles,
                missing_rtc,
                forever,
            };
            run_simulate(config, &schedule, &options)
        }
        Commands::Analyze { wav } => run_analyze(&config, &wav),
        Commands::Classify { hz } => run_classify(&config, hz),
        Commands::DumpConfig => run_dump(&config),
    }
}

struct SimulateOptions {
    noise: f32,
    seed: u64,
    cycles: Option<u64>,
    missing_rtc: bool,
    forever: bool,
}

fn run_simulate(
    mut config: AppConfig,
    schedule: &str,
    options: &SimulateOptions,
) -> Result<ExitCode> {
    // Virtual time: no reason to wait between cycles
    config.cycle.inter_cycle_delay_ms = 0;

    let steps = parse_schedule(schedule)?;
    let mut generator = ToneGenerator::new(config.sampling.sampling_frequency_hz);
    if options.noise > 0.0 {
        generator = generator.with_noise(options.noise, options.seed);
    }
    let input = ScheduledToneInput::new(generator, steps, config.sampling.sample_count);
    let total = options.cycles.unwrap_or_else(|| input.total_cycles());

    let motor = SimulatedMotor::new();
    let motor_state = motor.state();
    let hardware = Hardware {
        input: Box::new(input),
        clock: Arc::new(VirtualClock::new(0, (config.sampling.sampling_period_us() / 4).max(1))),
        actuator: Box::new(motor),
    };

    let mut rtc = if options.missing_rtc {
        SimulatedPeripheral::missing("RTC")
    } else {
        SimulatedPeripheral::present("RTC")
    };
    let telemetry = Arc::new(TelemetryHub::default());
    let started = ControlLoop::start(&config, hardware, Arc::clone(&telemetry), &mut [&mut rtc]);
    let mut control = match started {
        Ok(control) => control,
        Err(err) => halt(&err, &telemetry),
    };

    if options.forever {
        control.run(|report| match serde_json::to_string(report) {
            Ok(line) => println!("{}", line),
            Err(err) => log::warn!("Failed to serialize cycle {}: {}", report.cycle, err),
        });
    }

    for _ in 0..total {
        let report = control.run_cycle();
        println!("{}", serde_json::to_string(&report)?);
    }

    let snapshot = control.status_board().snapshot();
    eprintln!(
        "{} | cycles={} duty_writes={}",
        snapshot.status_line(),
        snapshot.cycle,
        motor_state.speed_writes()
    );
    Ok(ExitCode::from(0))
}

fn run_analyze(config: &AppConfig, path: &Path) -> Result<ExitCode> {
    let (samples, sample_rate) = read_wav(path)?;
    if sample_rate != config.sampling.sampling_frequency_hz {
        return Err(anyhow!(
            "{} is sampled at {} Hz but the analyzer expects {} Hz",
            path.display(),
            sample_rate,
            config.sampling.sampling_frequency_hz
        ));
    }

    let analyzer = SpectralAnalyzer::new(&config.sampling);
    let classifier = ToneClassifier::new(&config.bands);
    let n = config.sampling.sample_count;

    // Full blocks only, unless the file is shorter than one block
    let blocks: Vec<&[f32]> = if samples.len() < n {
        vec![samples.as_slice()]
    } else {
        samples.chunks_exact(n).collect()
    };

    for (index, block) in blocks.into_iter().enumerate() {
        let reading = analyzer.analyze(&SampleBuffer::from_real(block.to_vec()));
        let (tone, suppressed_peak_hz) = classifier.classify_suppressed(reading.frequency_hz);
        let report = BlockReport {
            block: index,
            start_sample: index * n,
            peak_hz: reading.frequency_hz,
            magnitude: reading.magnitude,
            tone,
            suppressed_peak_hz,
        };
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(ExitCode::from(0))
}

fn run_classify(config: &AppConfig, hz: f32) -> Result<ExitCode> {
    let classifier = ToneClassifier::new(&config.bands);
    let (tone, suppressed_peak_hz) = classifier.classify_suppressed(hz);
    let report = ClassifyReport {
        hz,
        tone,
        suppressed_peak_hz,
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(ExitCode::from(0))
}

fn run_dump(config: &AppConfig) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(ExitCode::from(0))
}

/// Read a WAV file as mono f32, averaging interleaved channels
fn read_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f32>>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f32;
            match spec.bits_per_sample {
                8 | 16 | 24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 / max).map_err(|err| anyhow!(err)))
                    .collect::<Result<Vec<f32>>>()?,
                other => {
                    return Err(anyhow!(
                        "Unsupported bits per sample {} in {}",
                        other,
                        path.display()
                    ))
                }
            }
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}
