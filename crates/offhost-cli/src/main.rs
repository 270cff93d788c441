mod audio;
mod list;
mod midi;
mod plugin;
mod process;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use offhost_automation::ParameterOverride;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Process(args) => process::process(args),
        Commands::ListParameters(args) => list::list_parameters(args),
        Commands::ListPlugins(args) => list::list_plugins(args),
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

#[derive(Parser)]
#[command(
    name = "offhost",
    author,
    version,
    about = "Render audio and MIDI through CLAP plug-ins offline"
)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process audio and/or MIDI files with a plug-in.
    Process(ProcessArgs),
    /// List a plug-in's parameters.
    ListParameters(ListParametersArgs),
    /// List the plug-ins contained in a CLAP library.
    ListPlugins(ListPluginsArgs),
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["inputs", "midi_input"])
))]
pub struct ProcessArgs {
    /// Plugin path.
    #[arg(short, long, value_parser = existing_path)]
    pub plugin: PathBuf,
    /// Id of the plug-in to load from a library containing several.
    #[arg(long)]
    pub plugin_id: Option<String>,
    /// Audio input files, fed to the plug-in's input ports in order.
    #[arg(short = 'i', long = "input", value_parser = existing_path)]
    pub inputs: Vec<PathBuf>,
    /// MIDI input file.
    #[arg(short, long, value_parser = existing_path)]
    pub midi_input: Option<PathBuf>,
    /// Preset file to load into the plug-in before processing.
    #[arg(long, value_parser = existing_path)]
    pub preset: Option<PathBuf>,
    /// Output audio file.
    #[arg(short, long)]
    pub output: PathBuf,
    /// Overwrite the output file if it exists.
    #[arg(short = 'y', long)]
    pub overwrite: bool,
    /// Sample rate to use when no audio input files are given.
    #[arg(short, long, default_value_t = 44_100, conflicts_with = "inputs")]
    pub sample_rate: u32,
    /// Number of samples processed per block.
    #[arg(short, long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    pub block_size: u32,
    /// Output bit depth. Defaults to the first input file's, or 16.
    #[arg(short = 'd', long, value_parser = parse_bit_depth)]
    pub bit_depth: Option<u16>,
    /// Channel count of the plug-in's output port.
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub out_channels: Option<u32>,
    /// JSON file with parameter values and automation.
    #[arg(long, value_parser = existing_path)]
    pub param_file: Option<PathBuf>,
    /// Parameter value as `<name>:<value>[:n]`; `:n` marks a normalized value.
    /// Takes precedence over the parameter file.
    #[arg(long = "param")]
    pub params: Vec<ParameterOverride>,
}

#[derive(Args)]
pub struct ListParametersArgs {
    /// Plugin path.
    #[arg(short, long, value_parser = existing_path)]
    pub plugin: PathBuf,
    /// Id of the plug-in to load from a library containing several.
    #[arg(long)]
    pub plugin_id: Option<String>,
    /// Sample rate to initialize the plug-in with.
    #[arg(short, long, default_value_t = 44_100)]
    pub sample_rate: u32,
    /// Block size to initialize the plug-in with.
    #[arg(short, long, default_value_t = 1024, value_parser = clap::value_parser!(u32).range(1..))]
    pub block_size: u32,
}

#[derive(Args)]
pub struct ListPluginsArgs {
    /// Plugin path.
    #[arg(short, long, value_parser = existing_path)]
    pub plugin: PathBuf,
}

/// Plug-ins may be bundle directories, so any existing path is accepted.
fn existing_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path does not exist: {value}"))
    }
}

fn parse_bit_depth(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(depth @ (8 | 16 | 24 | 32)) => Ok(depth),
        _ => Err(format!("{value} is not one of 8, 16, 24, 32")),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use offhost_automation::OverrideValue;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bit_depths() {
        assert_eq!(parse_bit_depth("24"), Ok(24));
        assert!(parse_bit_depth("12").is_err());
        assert!(parse_bit_depth("deep").is_err());
    }

    #[test]
    fn process_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("gain.clap");
        let midi = dir.path().join("notes.mid");
        std::fs::write(&plugin, b"").unwrap();
        std::fs::write(&midi, b"").unwrap();

        let cli = Cli::try_parse_from([
            "offhost",
            "process",
            "-p",
            plugin.to_str().unwrap(),
            "-m",
            midi.to_str().unwrap(),
            "-o",
            "out.wav",
            "--param",
            "Gain:0.5:n",
            "--param",
            "Mix:50%",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Process(args) = cli.command else {
            panic!("expected the process command");
        };
        assert_eq!(args.sample_rate, 44_100);
        assert_eq!(args.block_size, 1024);
        assert_eq!(args.params.len(), 2);
        assert_eq!(args.params[0].value, OverrideValue::Normalized(0.5));
        assert_eq!(args.params[1].value, OverrideValue::Text("50%".into()));
    }

    #[test]
    fn process_needs_an_input() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("gain.clap");
        std::fs::write(&plugin, b"").unwrap();

        let result = Cli::try_parse_from([
            "offhost",
            "process",
            "-p",
            plugin.to_str().unwrap(),
            "-o",
            "out.wav",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn sample_rate_conflicts_with_audio_input() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("gain.clap");
        let wav = dir.path().join("in.wav");
        std::fs::write(&plugin, b"").unwrap();
        std::fs::write(&wav, b"").unwrap();

        let result = Cli::try_parse_from([
            "offhost",
            "process",
            "-p",
            plugin.to_str().unwrap(),
            "-i",
            wav.to_str().unwrap(),
            "-s",
            "48000",
            "-o",
            "out.wav",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_overrides_are_rejected_while_parsing() {
        let dir = tempfile::tempdir().unwrap();
        let plugin = dir.path().join("gain.clap");
        std::fs::write(&plugin, b"").unwrap();

        let result = Cli::try_parse_from([
            "offhost",
            "process",
            "-p",
            plugin.to_str().unwrap(),
            "-m",
            plugin.to_str().unwrap(),
            "-o",
            "out.wav",
            "--param",
            "Gain:2:n",
        ]);
        assert!(result.is_err());
    }
}
