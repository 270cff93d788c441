use std::path::Path;
use std::process::{Command, Output};

use hound::{SampleFormat, WavSpec, WavWriter};

fn offhost(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_offhost"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run offhost")
}

fn write_wav(path: &Path, sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for _ in 0..16 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let output = offhost(&["--help"]);
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for command in ["process", "list-parameters", "list-plugins"] {
        assert!(help.contains(command), "{help}");
    }
}

#[test]
fn mismatched_sample_rates_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = dir.path().join("fake.clap");
    std::fs::write(&plugin, b"").unwrap();
    let first = dir.path().join("a.wav");
    let second = dir.path().join("b.wav");
    write_wav(&first, 44_100);
    write_wav(&second, 48_000);
    let out = dir.path().join("out.wav");

    let output = offhost(&[
        "process",
        "-p",
        plugin.to_str().unwrap(),
        "-i",
        first.to_str().unwrap(),
        "-i",
        second.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("mismatched sample rate"), "{}", stderr(&output));
    assert!(!out.exists());
}

#[test]
fn non_library_plugins_fail_before_processing() {
    let dir = tempfile::tempdir().unwrap();
    let plugin = dir.path().join("fake.clap");
    std::fs::write(&plugin, b"not a shared library").unwrap();
    let input = dir.path().join("in.wav");
    write_wav(&input, 44_100);
    let out = dir.path().join("out.wav");

    let output = offhost(&[
        "process",
        "-p",
        plugin.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid plugin identifier"), "{}", stderr(&output));
    assert!(!out.exists());

    let output = offhost(&["list-plugins", "-p", plugin.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn missing_paths_are_usage_errors() {
    let output = offhost(&["list-parameters", "-p", "/no/such/plugin.clap"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("path does not exist"));
}
