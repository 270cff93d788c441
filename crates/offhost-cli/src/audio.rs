use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap_host::AudioBuffer;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// A fully decoded input file, one `Vec` per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct InputAudio {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channels: Vec<Vec<f32>>,
}

impl InputAudio {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path)
            .with_context(|| format!("could not read input file {}", path.display()))?;
        Self::decode(reader).with_context(|| format!("error reading input file {}", path.display()))
    }

    fn decode<R: std::io::Read>(mut reader: WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        let channel_count = spec.channels as usize;
        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
            SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<Result<_, _>>()?
            }
        };

        let frames = interleaved.len() / channel_count.max(1);
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count.max(1)) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Ok(Self {
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            channels,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Copies the block starting at `start` into consecutive channels of
    /// `buffer`, beginning at `first_channel`. Frames past the end of the
    /// file are left silent.
    pub fn read_block(&self, start: u64, buffer: &mut AudioBuffer, first_channel: usize) {
        let frames = buffer.frames();
        for (index, source) in self.channels.iter().enumerate() {
            let target = &mut buffer[first_channel + index];
            let available = source
                .get(start as usize..)
                .map_or(&[][..], |rest| &rest[..rest.len().min(frames)]);
            target[..available.len()].copy_from_slice(available);
            target[available.len()..].fill(0.0);
        }
    }
}

/// Writes processed blocks into a WAV file.
pub struct OutputWriter {
    writer: WavWriter<BufWriter<File>>,
    bit_depth: u16,
}

impl OutputWriter {
    /// Integer PCM for 8, 16 and 24 bits, float for 32.
    pub fn create(path: &Path, sample_rate: u32, channels: u16, bit_depth: u16) -> Result<Self> {
        let spec = wav_spec(sample_rate, channels, bit_depth)?;
        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("could not create output file {}", path.display()))?;
        Ok(Self { writer, bit_depth })
    }

    /// Writes frames `start..end` of every channel, interleaved.
    pub fn write(&mut self, buffer: &AudioBuffer, start: usize, end: usize) -> Result<()> {
        for frame in start..end {
            for channel in buffer.channel_slices() {
                let sample = channel[frame];
                if self.bit_depth == 32 {
                    self.writer.write_sample(sample)?;
                } else {
                    self.writer.write_sample(quantise_sample(sample, self.bit_depth))?;
                }
            }
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("could not finalize output file")
    }
}

fn wav_spec(sample_rate: u32, channels: u16, bit_depth: u16) -> Result<WavSpec> {
    let sample_format = match bit_depth {
        8 | 16 | 24 => SampleFormat::Int,
        32 => SampleFormat::Float,
        other => bail!("unsupported output bit depth {other}"),
    };
    Ok(WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bit_depth,
        sample_format,
    })
}

fn quantise_sample(sample: f32, bit_depth: u16) -> i32 {
    let max = ((1_i64 << (bit_depth - 1)) - 1) as f32;
    (sample * max).round().clamp(-max, max) as i32
}
