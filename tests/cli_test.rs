use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tone_drive_cli"))
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8(stdout.to_vec())
        .expect("stdout utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[test]
fn simulate_prints_one_report_per_cycle() {
    let output = cli()
        .args(["simulate", "--schedule", "440:8,0:2,262:8"])
        .output()
        .expect("simulate command");

    assert!(
        output.status.success(),
        "simulate exited with {:?}",
        output.status.code()
    );
    let reports = json_lines(&output.stdout);
    assert_eq!(reports.len(), 18);

    let fired: Vec<u64> = reports
        .iter()
        .filter(|r| !r["transition"].is_null())
        .map(|r| r["cycle"].as_u64().unwrap())
        .collect();
    assert_eq!(fired, vec![6, 17]);
    assert_eq!(reports[5]["level_label"], "Half");
    assert_eq!(reports[8]["tone"], "none");
    assert_eq!(reports[16]["level"], 0);

    let stderr = String::from_utf8(output.stderr).expect("stderr utf8");
    assert!(
        stderr.contains("Speed: Off (0)  Dir: Forward"),
        "expected final status line, got {stderr}"
    );
}

#[test]
fn simulate_rejects_bad_schedule() {
    let output = cli()
        .args(["simulate", "--schedule", "440"])
        .output()
        .expect("simulate command");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_rtc_reports_once_and_halts() {
    let mut child = cli()
        .args(["simulate", "--schedule", "440:8", "--missing-rtc"])
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("simulate command");

    let stderr = child.stderr.take().expect("piped stderr");
    let (tx, rx) = mpsc::channel();
    let reader = thread::spawn(move || {
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            let _ = tx.send(line);
        }
    });

    let first = rx
        .recv_timeout(Duration::from_secs(10))
        .expect("diagnostic before halting");
    thread::sleep(Duration::from_millis(300));
    let still_running = child.try_wait().expect("poll child").is_none();
    let _ = child.kill();
    let _ = child.wait();
    reader.join().expect("stderr reader");

    let lines: Vec<String> = std::iter::once(first).chain(rx.try_iter()).collect();
    assert!(still_running, "halted process exited on its own");
    let diagnostics = lines
        .iter()
        .filter(|line| line.contains("Couldn't find RTC"))
        .count();
    assert_eq!(diagnostics, 1, "expected one diagnostic, got {lines:?}");
}

#[test]
fn simulate_forever_keeps_cycling_past_the_schedule() {
    let mut child = cli()
        .args(["simulate", "--schedule", "440:2", "--forever"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("simulate command");

    let stdout = child.stdout.take().expect("piped stdout");
    let cycles: Vec<u64> = BufReader::new(stdout)
        .lines()
        .take(10)
        .map(|line| {
            let report: Value = serde_json::from_str(&line.expect("stdout line")).expect("json");
            report["cycle"].as_u64().unwrap()
        })
        .collect();
    let _ = child.kill();
    let _ = child.wait();

    assert_eq!(cycles, (1..=10).collect::<Vec<u64>>());
}

#[test]
fn classify_reports_band() {
    let output = cli()
        .args(["classify", "--hz", "262"])
        .output()
        .expect("classify command");
    assert!(output.status.success());

    let reports = json_lines(&output.stdout);
    assert_eq!(reports[0]["tone"], "target_low");
    assert_eq!(reports[0]["suppressed_peak_hz"], 262.0);

    let output = cli()
        .args(["classify", "--hz", "350"])
        .output()
        .expect("classify command");
    let reports = json_lines(&output.stdout);
    assert_eq!(reports[0]["tone"], "none");
    assert_eq!(reports[0]["suppressed_peak_hz"], 0.0);
}

#[test]
fn dump_config_prints_defaults() {
    let output = cli().arg("dump-config").output().expect("dump-config command");
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).expect("config json");
    assert_eq!(config["sampling"]["sample_count"], 64);
    assert_eq!(config["sampling"]["sampling_frequency_hz"], 1000);
    assert_eq!(config["controller"]["debounce_threshold"], 5);
    assert_eq!(config["controller"]["levels"].as_array().unwrap().len(), 4);
}

#[test]
fn invalid_config_file_is_reported() {
    let path = std::env::temp_dir().join(format!("tone-drive-bad-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "sampling": { "sample_count": 48, "sampling_frequency_hz": 1000 } }"#).unwrap();

    let output = cli()
        .args(["--config", path.to_str().unwrap(), "dump-config"])
        .output()
        .expect("dump-config command");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr utf8");
    assert!(stderr.contains("3001"), "expected config error code, got {stderr}");
}

fn write_tone_wav(path: &PathBuf, sample_rate: u32, frequency: f32, samples: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..samples {
        let t = i as f32 / sample_rate as f32;
        let value = (std::f32::consts::TAU * frequency * t).sin() * 0.5;
        writer.write_sample((value * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn analyze_wav_classifies_blocks() {
    let path = std::env::temp_dir().join(format!("tone-drive-440-{}.wav", std::process::id()));
    write_tone_wav(&path, 1000, 440.0, 256);

    let output = cli()
        .args(["analyze", "--wav", path.to_str().unwrap()])
        .output()
        .expect("analyze command");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let blocks = json_lines(&output.stdout);
    assert_eq!(blocks.len(), 4);
    for block in blocks {
        assert_eq!(block["tone"], "target_high");
        let peak = block["peak_hz"].as_f64().unwrap();
        assert!((peak - 440.0).abs() < 2.0, "peak {peak}");
    }
}

#[test]
fn analyze_rejects_mismatched_sample_rate() {
    let path = std::env::temp_dir().join(format!("tone-drive-8k-{}.wav", std::process::id()));
    write_tone_wav(&path, 8000, 440.0, 512);

    let output = cli()
        .args(["analyze", "--wav", path.to_str().unwrap()])
        .output()
        .expect("analyze command");
    let _ = std::fs::remove_file(&path);

    assert_eq!(output.status.code(), Some(1));
}
