//! Tone command decoding
//!
//! A tone command travels as four packed 32-bit integers:
//!
//! - `frequency`: bits 0-15 start frequency, bits 16-31 end frequency (Hz)
//! - `duration`: byte 0 sustain, byte 1 release, byte 2 decay, byte 3 attack
//! - `volume`: byte 0 sustain level, byte 1 peak level (percent)
//! - `flags`: bits 0-1 channel, bits 2-3 mode, bits 4-5 pan
//!
//! Every field is masked on decode; nothing is rejected. Durations are ticks
//! of a 60 Hz clock, volumes are percentages clamped to 100.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::constants::VOLUME_PERCENT_MAX;

bitflags! {
    /// Output sides a voice is routed to
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PanRouting: u8 {
        /// Left output
        const LEFT = 0x01;
        /// Right output
        const RIGHT = 0x02;
    }
}

impl PanRouting {
    /// Routing for a raw 2-bit pan value.
    ///
    /// 1 is left-only, 2 is right-only, 0 and 3 feed both sides.
    #[inline]
    pub fn from_pan(pan: u8) -> Self {
        let mut routing = PanRouting::empty();
        if pan != 2 {
            routing |= PanRouting::LEFT;
        }
        if pan != 1 {
            routing |= PanRouting::RIGHT;
        }
        routing
    }
}

/// Stereo placement of a tone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pan {
    /// Both outputs
    #[default]
    Center,
    /// Left output only
    Left,
    /// Right output only
    Right,
}

impl Pan {
    /// Decode a raw 2-bit pan value (3 behaves as center)
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            1 => Pan::Left,
            2 => Pan::Right,
            _ => Pan::Center,
        }
    }

    /// Raw 2-bit encoding
    pub fn bits(self) -> u8 {
        match self {
            Pan::Center => 0,
            Pan::Left => 1,
            Pan::Right => 2,
        }
    }
}

/// Pulse duty cycle selected by the mode bits.
///
/// Mode 0 is 12.5%, mode 2 is 50%, every other mode is 25%.
#[inline]
pub fn duty_cycle_for_mode(mode: u8) -> f32 {
    match mode {
        0 => 0.125,
        2 => 0.5,
        _ => 0.25,
    }
}

/// A decoded tone command.
///
/// All fields hold already-masked values; [`ToneCommand::encode`] packs
/// them back into the four-word wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneCommand {
    /// Start frequency in Hz
    pub freq1: u16,
    /// End frequency in Hz, 0 disables the sweep
    pub freq2: u16,
    /// Attack length in 60 Hz ticks
    pub attack: u8,
    /// Decay length in 60 Hz ticks
    pub decay: u8,
    /// Sustain length in 60 Hz ticks
    pub sustain: u8,
    /// Release length in 60 Hz ticks
    pub release: u8,
    /// Sustain level in percent (0-100)
    pub sustain_volume: u8,
    /// Peak level in percent (0-100), 0 means full level
    pub peak_volume: u8,
    /// Target voice (0-1 pulse, 2 triangle, 3 noise)
    pub channel: u8,
    /// Voice mode, selects the pulse duty cycle
    pub mode: u8,
    /// Raw pan bits (0 center, 1 left, 2 right, 3 center)
    pub pan: u8,
}

impl ToneCommand {
    /// Decode the four packed words of a tone command.
    pub fn decode(frequency: u32, duration: u32, volume: u32, flags: u32) -> Self {
        ToneCommand {
            freq1: (frequency & 0xffff) as u16,
            freq2: ((frequency >> 16) & 0xffff) as u16,
            sustain: byte(duration, 0),
            release: byte(duration, 1),
            decay: byte(duration, 2),
            attack: byte(duration, 3),
            sustain_volume: clamp_percent(byte(volume, 0)),
            peak_volume: clamp_percent(byte(volume, 1)),
            channel: (flags & 0x03) as u8,
            mode: ((flags >> 2) & 0x03) as u8,
            pan: ((flags >> 4) & 0x03) as u8,
        }
    }

    /// Pack the command into `(frequency, duration, volume, flags)`.
    ///
    /// Fields wider than their bit slot are masked, volumes are clamped, so
    /// `decode(encode(c))` is the normalized form of `c`.
    pub fn encode(&self) -> (u32, u32, u32, u32) {
        let frequency = self.freq1 as u32 | (self.freq2 as u32) << 16;
        let duration = self.sustain as u32
            | (self.release as u32) << 8
            | (self.decay as u32) << 16
            | (self.attack as u32) << 24;
        let volume = clamp_percent(self.sustain_volume) as u32
            | (clamp_percent(self.peak_volume) as u32) << 8;
        let flags = (self.channel as u32 & 0x03)
            | (self.mode as u32 & 0x03) << 2
            | (self.pan as u32 & 0x03) << 4;
        (frequency, duration, volume, flags)
    }

    /// Start a command for `channel` at a constant frequency.
    pub fn new(channel: u8, freq: u16) -> Self {
        ToneCommand {
            freq1: freq,
            channel: channel & 0x03,
            ..Default::default()
        }
    }

    /// Sweep the frequency to `freq2` over the whole note
    pub fn sweep_to(mut self, freq2: u16) -> Self {
        self.freq2 = freq2;
        self
    }

    /// Set the envelope durations, all in 60 Hz ticks
    pub fn adsr(mut self, attack: u8, decay: u8, sustain: u8, release: u8) -> Self {
        self.attack = attack;
        self.decay = decay;
        self.sustain = sustain;
        self.release = release;
        self
    }

    /// Set sustain and peak levels in percent
    pub fn volume(mut self, sustain: u8, peak: u8) -> Self {
        self.sustain_volume = clamp_percent(sustain);
        self.peak_volume = clamp_percent(peak);
        self
    }

    /// Set the mode bits (pulse duty cycle)
    pub fn mode(mut self, mode: u8) -> Self {
        self.mode = mode & 0x03;
        self
    }

    /// Set the stereo placement
    pub fn pan(mut self, pan: Pan) -> Self {
        self.pan = pan.bits();
        self
    }

    /// Decoded stereo placement
    pub fn pan_position(&self) -> Pan {
        Pan::from_bits(self.pan)
    }

    /// Total envelope length in ticks, before any triangle release padding
    pub fn total_ticks(&self) -> u32 {
        self.attack as u32 + self.decay as u32 + self.sustain as u32 + self.release as u32
    }
}

#[inline]
fn byte(word: u32, index: u32) -> u8 {
    ((word >> (index * 8)) & 0xff) as u8
}

#[inline]
fn clamp_percent(value: u8) -> u8 {
    value.min(VOLUME_PERCENT_MAX as u8)
}
