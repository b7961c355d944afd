//! Voice state snapshots for inspection and visualization.
//!
//! A [`ChannelStates`] value is a copy of what each voice is doing at one
//! sample time: envelope stage, current frequency and level, routing, and the
//! nearest musical note.
//!
//! # Example
//!
//! ```
//! use chiptone::{Apu, ToneCommand};
//!
//! let mut apu = Apu::new();
//! apu.play(&ToneCommand::new(0, 440).adsr(0, 0, 30, 0).volume(100, 0));
//! let states = apu.channel_states();
//!
//! let lead = &states.channels[0];
//! assert!(lead.active);
//! assert_eq!(lead.note.map(|n| n.to_string()), Some("A4".to_string()));
//! ```

use std::fmt;

use serde::Serialize;

use crate::channel::{Channel, ChannelKind, EnvelopePhase};
use crate::command::Pan;
use crate::constants::NUM_CHANNELS;

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Musical note nearest to a frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Note {
    /// MIDI note number (69 = A4)
    pub midi: u8,
}

impl Note {
    /// Nearest note to `freq`, `None` outside the audible MIDI range
    pub fn from_frequency(freq: f32) -> Option<Self> {
        if !(20.0..=20_000.0).contains(&freq) {
            return None;
        }
        let midi = (12.0 * (freq / 440.0).log2() + 69.0).round() as i32;
        (0..=127).contains(&midi).then(|| Note { midi: midi as u8 })
    }

    /// Pitch class, e.g. `"C#"`
    pub fn pitch_class(&self) -> &'static str {
        PITCH_CLASSES[self.midi as usize % 12]
    }

    /// Octave number, MIDI 60 is in octave 4
    pub fn octave(&self) -> i8 {
        (self.midi / 12) as i8 - 1
    }

    /// Equal-tempered frequency of the note
    pub fn frequency(&self) -> f32 {
        440.0 * 2f32.powf((self.midi as f32 - 69.0) / 12.0)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

/// State of a single voice at one sample time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelState {
    /// Voice role
    pub kind: ChannelKind,
    /// Whether the voice currently sounds
    pub active: bool,
    /// Envelope stage
    pub phase: EnvelopePhase,
    /// Current frequency in Hz (0 when idle)
    pub frequency: u16,
    /// Current envelope level (0 when idle)
    pub volume: i16,
    /// Envelope level relative to the voice's full scale (0.0-1.0)
    pub volume_normalized: f32,
    /// Stereo placement
    pub pan: Pan,
    /// Pulse duty cycle (pulse voices only)
    pub duty_cycle: Option<f32>,
    /// Nearest musical note (tonal voices only)
    pub note: Option<Note>,
    /// Samples left until the voice goes idle
    pub remaining_samples: u64,
}

impl ChannelState {
    /// Snapshot `channel` at sample time `time`.
    ///
    /// `max_volume` is the full-scale level for the voice's role.
    pub fn capture(channel: &Channel, time: u64, max_volume: i16) -> Self {
        let active = channel.is_active(time);
        let (frequency, volume) = if active {
            (channel.frequency_at(time), channel.volume_at(time))
        } else {
            (0, 0)
        };
        let note = match channel.kind() {
            ChannelKind::Noise => None,
            _ if active => Note::from_frequency(frequency as f32),
            _ => None,
        };

        ChannelState {
            kind: channel.kind(),
            active,
            phase: channel.envelope_phase_at(time),
            frequency,
            volume,
            volume_normalized: if max_volume > 0 {
                (volume as f32 / max_volume as f32).clamp(0.0, 1.0)
            } else {
                0.0
            },
            pan: Pan::from_bits(channel.pan()),
            duty_cycle: channel.duty_cycle(),
            note,
            remaining_samples: channel.markers()[4].saturating_sub(time),
        }
    }
}

/// Snapshot of all four voices
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStates {
    /// Sample time of the snapshot
    pub time: u64,
    /// Voices 0-3
    pub channels: [ChannelState; NUM_CHANNELS],
}

impl ChannelStates {
    /// Voices currently sounding
    pub fn active_channels(&self) -> impl Iterator<Item = (usize, &ChannelState)> {
        self.channels.iter().enumerate().filter(|(_, ch)| ch.active)
    }

    /// Whether every voice is idle
    pub fn is_silent(&self) -> bool {
        self.channels.iter().all(|ch| !ch.active)
    }

    /// Highest normalized level across all voices (for VU meters)
    pub fn max_level(&self) -> f32 {
        self.channels
            .iter()
            .map(|ch| ch.volume_normalized)
            .fold(0.0, f32::max)
    }
}
