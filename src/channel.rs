//! Voice state and the tone-command state transition
//!
//! Every voice keeps absolute sample-time markers for its envelope. A tone
//! command rewrites them relative to the current global time; the synthesis
//! loop only reads them back.

use serde::{Deserialize, Serialize};

use crate::command::{duty_cycle_for_mode, ToneCommand};
use crate::constants::{
    samples_per_millisecond, ticks_to_samples, TRIANGLE_START_PHASE, VOLUME_PERCENT_MAX,
};
use crate::noise::NoiseGenerator;
use crate::ramp::ramp;
use crate::waveform::{advance_phase, phase_increment, pulse_sample, triangle_sample};

/// Role of a voice, fixed by its index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Band-limited pulse wave with selectable duty cycle (voices 0 and 1)
    Pulse,
    /// Triangle wave (voice 2)
    Triangle,
    /// LFSR noise (voice 3)
    Noise,
}

impl ChannelKind {
    /// Role of the voice at `index` (masked to 0-3)
    pub fn from_index(index: usize) -> Self {
        match index & 0x03 {
            0 | 1 => ChannelKind::Pulse,
            2 => ChannelKind::Triangle,
            _ => ChannelKind::Noise,
        }
    }

    /// Phase a voice restarts from when triggered while idle
    #[inline]
    pub fn start_phase(self) -> f32 {
        match self {
            ChannelKind::Triangle => TRIANGLE_START_PHASE,
            _ => 0.0,
        }
    }
}

/// Envelope stage of a voice at a given sample time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopePhase {
    /// Rising from silence to the peak level
    Attack,
    /// Moving from the peak to the sustain level
    Decay,
    /// Holding the sustain level
    Sustain,
    /// Falling from the sustain level to silence
    Release,
    /// Past the release marker, contributes nothing
    Idle,
}

/// State of one voice.
///
/// Pulse voices use `duty_cycle`, the noise voice uses `noise`; the other
/// voices leave those fields untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    kind: ChannelKind,
    /// Start frequency in Hz
    pub(crate) freq1: u16,
    /// End frequency in Hz, 0 for no sweep
    pub(crate) freq2: u16,
    pub(crate) start_time: u64,
    pub(crate) attack_time: u64,
    pub(crate) decay_time: u64,
    pub(crate) sustain_time: u64,
    pub(crate) release_time: u64,
    pub(crate) sustain_volume: i16,
    pub(crate) peak_volume: i16,
    /// Oscillator phase in [0, 1), or the noise clock accumulator
    pub(crate) phase: f32,
    /// Raw pan bits
    pub(crate) pan: u8,
    pub(crate) duty_cycle: f32,
    pub(crate) noise: NoiseGenerator,
}

impl Channel {
    /// Create a silent voice with the role of `index`
    pub fn new(index: usize) -> Self {
        Channel {
            kind: ChannelKind::from_index(index),
            freq1: 0,
            freq2: 0,
            start_time: 0,
            attack_time: 0,
            decay_time: 0,
            sustain_time: 0,
            release_time: 0,
            sustain_volume: 0,
            peak_volume: 0,
            phase: 0.0,
            pan: 0,
            duty_cycle: 0.0,
            noise: NoiseGenerator::new(),
        }
    }

    /// Role of this voice
    #[inline]
    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Whether the voice sounds at sample time `time`
    #[inline]
    pub fn is_active(&self, time: u64) -> bool {
        time < self.release_time
    }

    /// Start and end frequency
    pub fn frequencies(&self) -> (u16, u16) {
        (self.freq1, self.freq2)
    }

    /// Envelope markers `[start, attack, decay, sustain, release]`
    pub fn markers(&self) -> [u64; 5] {
        [
            self.start_time,
            self.attack_time,
            self.decay_time,
            self.sustain_time,
            self.release_time,
        ]
    }

    /// Scaled peak level
    pub fn peak_volume(&self) -> i16 {
        self.peak_volume
    }

    /// Scaled sustain level
    pub fn sustain_volume(&self) -> i16 {
        self.sustain_volume
    }

    /// Current oscillator phase (or noise accumulator)
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Raw pan bits
    pub fn pan(&self) -> u8 {
        self.pan
    }

    /// Pulse duty cycle, `None` for non-pulse voices
    pub fn duty_cycle(&self) -> Option<f32> {
        (self.kind == ChannelKind::Pulse).then_some(self.duty_cycle)
    }

    /// Noise generator state, `None` for non-noise voices
    pub fn noise(&self) -> Option<&NoiseGenerator> {
        (self.kind == ChannelKind::Noise).then_some(&self.noise)
    }

    /// Apply a tone command issued at global sample time `now`.
    ///
    /// `max_volume` is the full-scale level for this voice's role.
    pub fn apply_tone(&mut self, cmd: &ToneCommand, now: u64, sample_rate: u32, max_volume: i16) {
        // Legato: a voice still sounding keeps its phase
        if now > self.release_time {
            self.phase = self.kind.start_phase();
        }

        self.freq1 = cmd.freq1;
        self.freq2 = cmd.freq2;

        self.start_time = now;
        self.attack_time = self.start_time + ticks_to_samples(sample_rate, cmd.attack);
        self.decay_time = self.attack_time + ticks_to_samples(sample_rate, cmd.decay);
        self.sustain_time = self.decay_time + ticks_to_samples(sample_rate, cmd.sustain);
        self.release_time = self.sustain_time + ticks_to_samples(sample_rate, cmd.release);

        self.sustain_volume = scale_volume(max_volume, cmd.sustain_volume);
        self.peak_volume = if cmd.peak_volume == 0 {
            max_volume
        } else {
            scale_volume(max_volume, cmd.peak_volume)
        };
        self.pan = cmd.pan & 0x03;

        match self.kind {
            ChannelKind::Pulse => {
                self.duty_cycle = duty_cycle_for_mode(cmd.mode);
            }
            ChannelKind::Triangle => {
                // 1 ms tail so a hard stop does not click
                if cmd.release == 0 {
                    self.release_time += samples_per_millisecond(sample_rate);
                }
            }
            ChannelKind::Noise => {}
        }
    }

    /// Frequency at sample time `time` (the voice must be active)
    #[inline]
    pub fn frequency_at(&self, time: u64) -> u16 {
        if self.freq2 > 0 {
            ramp(
                self.freq1 as i32,
                self.freq2 as i32,
                time,
                self.start_time,
                self.release_time,
            ) as u16
        } else {
            self.freq1
        }
    }

    /// Envelope stage at sample time `time`
    pub fn envelope_phase_at(&self, time: u64) -> EnvelopePhase {
        if !self.is_active(time) {
            EnvelopePhase::Idle
        } else if time >= self.sustain_time {
            EnvelopePhase::Release
        } else if time >= self.decay_time {
            EnvelopePhase::Sustain
        } else if time >= self.attack_time {
            EnvelopePhase::Decay
        } else {
            EnvelopePhase::Attack
        }
    }

    /// Envelope level at sample time `time` (the voice must be active).
    ///
    /// Markers are compared from the release end backwards, so a zero-length
    /// stage is skipped.
    #[inline]
    pub fn volume_at(&self, time: u64) -> i16 {
        let level = if time >= self.sustain_time {
            ramp(
                self.sustain_volume as i32,
                0,
                time,
                self.sustain_time,
                self.release_time,
            )
        } else if time >= self.decay_time {
            self.sustain_volume as i32
        } else if time >= self.attack_time {
            ramp(
                self.peak_volume as i32,
                self.sustain_volume as i32,
                time,
                self.attack_time,
                self.decay_time,
            )
        } else {
            ramp(0, self.peak_volume as i32, time, self.start_time, self.attack_time)
        };
        level as i16
    }

    /// Produce this voice's sample for sample time `time` and advance its
    /// oscillator. Idle voices return 0 and keep their phase.
    #[inline]
    pub fn next_sample(&mut self, time: u64, sample_rate: u32) -> i16 {
        if !self.is_active(time) {
            return 0;
        }
        let freq = self.frequency_at(time);
        let volume = self.volume_at(time);

        match self.kind {
            ChannelKind::Noise => {
                let random = self.noise.advance(&mut self.phase, freq, sample_rate);
                (volume as i32 * random as i32) as i16
            }
            ChannelKind::Triangle => {
                advance_phase(&mut self.phase, phase_increment(freq, sample_rate));
                triangle_sample(self.phase, volume)
            }
            ChannelKind::Pulse => {
                let inc = phase_increment(freq, sample_rate);
                advance_phase(&mut self.phase, inc);
                pulse_sample(self.phase, inc, self.duty_cycle, volume)
            }
        }
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Channel {
            kind: self.kind,
            ..Channel::new(0)
        };
    }
}

/// Scale `percent` (clamped to 100) of `max_volume`
#[inline]
fn scale_volume(max_volume: i16, percent: u8) -> i16 {
    let percent = percent.min(VOLUME_PERCENT_MAX as u8);
    (max_volume as i32 * percent as i32 / 100) as i16
}
