//! Standard MIDI File input, flattened onto a sample timeline.

use std::path::Path;

use anyhow::{Context, Result};
use clap_host::MidiEvent;
use midly::{MidiMessage, Smf, Timing, TrackEventKind};
use offhost_automation::seconds_to_samples;
use tracing::debug;

const DEFAULT_MICROS_PER_BEAT: f64 = 500_000.0;

/// A short MIDI message at an absolute sample position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    pub sample: u64,
    pub data: [u8; 3],
}

/// Every channel message of a MIDI file, merged across tracks and sorted by
/// sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MidiSequence {
    events: Vec<TimedMessage>,
    length: u64,
}

impl MidiSequence {
    pub fn open(path: &Path, sample_rate: f64) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("could not read MIDI input file {}", path.display()))?;
        Self::parse(&data, sample_rate)
            .with_context(|| format!("error reading MIDI input file {}", path.display()))
    }

    pub fn parse(data: &[u8], sample_rate: f64) -> Result<Self> {
        let smf = Smf::parse(data)?;
        let clock = TickClock::new(&smf);

        let mut events = Vec::new();
        let mut length = 0;
        for track in &smf.tracks {
            let mut tick = 0u64;
            for event in track {
                tick += u64::from(event.delta.as_int());
                let sample = seconds_to_samples(clock.seconds(tick), sample_rate);
                length = length.max(sample);
                if let TrackEventKind::Midi { channel, message } = event.kind {
                    events.push(TimedMessage {
                        sample,
                        data: encode(channel.as_int(), message),
                    });
                }
            }
        }
        events.sort_by_key(|event| event.sample);

        debug!(
            tracks = smf.tracks.len(),
            events = events.len(),
            length,
            "parsed MIDI file"
        );
        Ok(Self { events, length })
    }

    /// Sample of the last event of any kind.
    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn events(&self) -> &[TimedMessage] {
        &self.events
    }

    /// Events inside `[start, start + frames)`, with offsets relative to
    /// `start`.
    pub fn block(&self, start: u64, frames: usize) -> impl Iterator<Item = MidiEvent> + '_ {
        let end = start + frames as u64;
        let first = self.events.partition_point(|event| event.sample < start);
        self.events[first..]
            .iter()
            .take_while(move |event| event.sample < end)
            .map(move |event| MidiEvent {
                offset: (event.sample - start) as u32,
                data: event.data,
            })
    }
}

/// Converts ticks to seconds through the file's tempo map.
struct TickClock {
    kind: ClockKind,
}

enum ClockKind {
    /// Ticks per beat and the tempo changes as `(tick, micros per beat)`.
    Metrical {
        ticks_per_beat: f64,
        tempo_changes: Vec<(u64, f64)>,
    },
    /// SMPTE timing does not depend on tempo.
    Timecode { ticks_per_second: f64 },
}

impl TickClock {
    fn new(smf: &Smf<'_>) -> Self {
        let kind = match smf.header.timing {
            Timing::Metrical(ticks_per_beat) => {
                let mut tempo_changes = Vec::new();
                for track in &smf.tracks {
                    let mut tick = 0u64;
                    for event in track {
                        tick += u64::from(event.delta.as_int());
                        if let TrackEventKind::Meta(midly::MetaMessage::Tempo(tempo)) = event.kind
                        {
                            tempo_changes.push((tick, f64::from(tempo.as_int())));
                        }
                    }
                }
                tempo_changes.sort_by_key(|&(tick, _)| tick);
                ClockKind::Metrical {
                    ticks_per_beat: f64::from(ticks_per_beat.as_int()),
                    tempo_changes,
                }
            }
            Timing::Timecode(fps, subframes) => ClockKind::Timecode {
                ticks_per_second: f64::from(fps.as_f32()) * f64::from(subframes),
            },
        };
        Self { kind }
    }

    fn seconds(&self, tick: u64) -> f64 {
        match &self.kind {
            ClockKind::Timecode { ticks_per_second } => tick as f64 / ticks_per_second,
            ClockKind::Metrical {
                ticks_per_beat,
                tempo_changes,
            } => {
                let mut seconds = 0.0;
                let mut last_tick = 0u64;
                let mut micros_per_beat = DEFAULT_MICROS_PER_BEAT;
                for &(change_tick, tempo) in tempo_changes {
                    if change_tick >= tick {
                        break;
                    }
                    seconds += (change_tick - last_tick) as f64 / ticks_per_beat
                        * micros_per_beat
                        / 1_000_000.0;
                    last_tick = change_tick;
                    micros_per_beat = tempo;
                }
                seconds + (tick - last_tick) as f64 / ticks_per_beat * micros_per_beat / 1_000_000.0
            }
        }
    }
}

fn encode(channel: u8, message: MidiMessage) -> [u8; 3] {
    match message {
        MidiMessage::NoteOff { key, vel } => [0x80 | channel, key.as_int(), vel.as_int()],
        MidiMessage::NoteOn { key, vel } => [0x90 | channel, key.as_int(), vel.as_int()],
        MidiMessage::Aftertouch { key, vel } => [0xa0 | channel, key.as_int(), vel.as_int()],
        MidiMessage::Controller { controller, value } => {
            [0xb0 | channel, controller.as_int(), value.as_int()]
        }
        MidiMessage::ProgramChange { program } => [0xc0 | channel, program.as_int(), 0],
        MidiMessage::ChannelAftertouch { vel } => [0xd0 | channel, vel.as_int(), 0],
        MidiMessage::PitchBend { bend } => {
            let raw = bend.0.as_int();
            [0xe0 | channel, (raw & 0x7f) as u8, (raw >> 7) as u8]
        }
    }
}
