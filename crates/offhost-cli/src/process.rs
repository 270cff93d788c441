use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use clap_host::{AudioBuffer, AudioConfig, BusLayout, ClapInstance, MidiEvent};
use offhost_automation::{
    merge_overrides, parse_definition_str, ParameterAutomation, ParameterOverride, Plugin,
};
use tracing::{debug, info};

use crate::audio::{InputAudio, OutputWriter};
use crate::midi::MidiSequence;
use crate::plugin::load_plugin;
use crate::ProcessArgs;

const DEFAULT_BIT_DEPTH: u16 = 16;

pub fn process(args: ProcessArgs) -> Result<()> {
    let inputs = args
        .inputs
        .iter()
        .map(|path| InputAudio::open(path))
        .collect::<Result<Vec<_>>>()?;

    let mut sample_rate = args.sample_rate;
    let mut bit_depth = DEFAULT_BIT_DEPTH;
    if let Some(first) = inputs.first() {
        ensure!(
            inputs.iter().all(|input| input.sample_rate == first.sample_rate),
            "mismatched sample rate between input files"
        );
        sample_rate = first.sample_rate;
        bit_depth = first.bits_per_sample;
    }
    if let Some(depth) = args.bit_depth {
        bit_depth = depth;
    }
    let mut total_length = inputs.iter().map(|input| input.frames() as u64).max().unwrap_or(0);

    let midi = match &args.midi_input {
        Some(path) => {
            let sequence = MidiSequence::open(path, f64::from(sample_rate))?;
            debug!(
                events = sequence.events().len(),
                length = sequence.length(),
                "MIDI input"
            );
            total_length = total_length.max(sequence.length());
            Some(sequence)
        }
        None => None,
    };

    let mut plugin = load_plugin(&args.plugin, args.plugin_id.as_deref())?;
    println!(
        "Loaded plugin {} ({})",
        plugin.descriptor().name,
        plugin.descriptor().id
    );

    if let Some(preset) = &args.preset {
        let data = fs::read(preset)
            .with_context(|| format!("could not read preset file {}", preset.display()))?;
        plugin
            .load_state(&data)
            .with_context(|| format!("error applying preset {}", preset.display()))?;
    }

    let layout = bus_layout(&plugin, &inputs, args.out_channels);
    debug!(?layout, "bus layout");

    let automation = build_automation(
        &plugin,
        args.param_file.as_deref(),
        &args.params,
        f64::from(sample_rate),
        total_length,
    )?;

    let block_size = args.block_size as usize;
    let config = AudioConfig {
        sample_rate: f64::from(sample_rate),
        min_frames_count: args.block_size,
        max_frames_count: args.block_size,
    };
    unsafe {
        plugin.activate(config, layout.clone())?;
        plugin.start_processing()?;
    }
    let latency = u64::from(plugin.latency());

    if args.output.exists() && !args.overwrite {
        bail!("output file already exists! Use --overwrite to overwrite the file");
    }
    let out_channels = output_channel_count(&layout)?;
    let mut writer = OutputWriter::create(&args.output, sample_rate, out_channels, bit_depth)?;

    info!(total_length, latency, block_size, sample_rate, "processing");
    let mut input_buffer = AudioBuffer::new(layout.input_channels(), block_size);
    let mut output_buffer = AudioBuffer::new(layout.output_channels(), block_size);
    let mut midi_block: Vec<MidiEvent> = Vec::with_capacity(1024);
    let mut sample_index = 0u64;
    let mut skipped = 0u64;
    while sample_index < total_length + latency {
        input_buffer.clear();
        output_buffer.clear();

        let mut channel = 0;
        for input in &inputs {
            input.read_block(sample_index, &mut input_buffer, channel);
            channel += input.channel_count();
        }

        midi_block.clear();
        if let Some(midi) = &midi {
            midi_block.extend(midi.block(sample_index, block_size));
        }

        automation
            .apply(&mut plugin, sample_index)
            .with_context(|| format!("applying automation at sample {sample_index}"))?;
        plugin
            .process(&mut input_buffer, &mut output_buffer, &midi_block, block_size)
            .with_context(|| format!("processing block at sample {sample_index}"))?;

        let start = skip_latency(latency, &mut skipped, block_size);
        writer.write(&output_buffer, start, block_size)?;

        sample_index += block_size as u64;
    }

    unsafe {
        plugin.deactivate();
    }
    writer.finalize()?;
    info!(output = %args.output.display(), "done");
    Ok(())
}

/// One input port per input file. Without input files the plug-in keeps its
/// own input ports, which synths tend to expect. The single output port gets
/// `out_channels`, else the first file's channel count, else the plug-in's
/// main output width.
fn bus_layout(plugin: &ClapInstance, inputs: &[InputAudio], out_channels: Option<u32>) -> BusLayout {
    let default_inputs = || plugin.default_layout().inputs;
    let default_output = || plugin.main_output_channels();
    layout_for(inputs, out_channels, default_inputs, default_output)
}

fn layout_for(
    inputs: &[InputAudio],
    out_channels: Option<u32>,
    default_inputs: impl FnOnce() -> Vec<u32>,
    default_output: impl FnOnce() -> u32,
) -> BusLayout {
    let input_ports = if inputs.is_empty() {
        default_inputs()
    } else {
        inputs
            .iter()
            .map(|input| input.channel_count() as u32)
            .collect()
    };
    let output = out_channels.unwrap_or_else(|| match inputs.first() {
        Some(first) => first.channel_count() as u32,
        None => default_output(),
    });
    BusLayout {
        inputs: input_ports,
        outputs: vec![output],
    }
}

fn output_channel_count(layout: &BusLayout) -> Result<u16> {
    ensure!(
        layout.output_channels() > 0,
        "the plugin has no output channels; set the channel count with --out-channels"
    );
    u16::try_from(layout.output_channels()).context("too many output channels for a WAV file")
}

/// Builds the automation table from the parameter file and applies the
/// command-line overrides on top.
pub fn build_automation<P>(
    plugin: &P,
    param_file: Option<&Path>,
    overrides: &[ParameterOverride],
    sample_rate: f64,
    total_length: u64,
) -> Result<ParameterAutomation>
where
    P: Plugin + ?Sized,
{
    let mut automation = match param_file {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("could not read parameter file {}", path.display()))?;
            parse_definition_str(&json, plugin, sample_rate, total_length)
                .with_context(|| format!("invalid parameter file {}", path.display()))?
        }
        None => ParameterAutomation::new(),
    };
    merge_overrides(&mut automation, overrides, plugin)?;
    Ok(automation)
}

/// Returns the first frame of the block to keep, consuming the plug-in's
/// latency from the start of the output.
fn skip_latency(latency: u64, skipped: &mut u64, block_size: usize) -> usize {
    if *skipped >= latency {
        return 0;
    }
    let start = (latency - *skipped).min(block_size as u64);
    *skipped += start;
    start as usize
}
