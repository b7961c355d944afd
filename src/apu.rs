//! Four-voice tone engine
//!
//! Owns the voices and the global sample clock. Tone commands rewrite voice
//! state relative to the clock; [`Apu::write_samples_into`] runs the clock
//! forward one stereo frame at a time.

use crate::channel::Channel;
use crate::channel_state::{ChannelState, ChannelStates};
use crate::command::ToneCommand;
use crate::config::ApuConfig;
use crate::constants::NUM_CHANNELS;
use crate::mixer::StereoMixer;
use crate::Result;

/// Four-voice sound chip: two pulse voices, a triangle and a noise voice.
///
/// # Example
///
/// ```
/// use chiptone::Apu;
///
/// let mut apu = Apu::new();
///
/// // 440 Hz on voice 0, one second of sustain at 50%
/// apu.tone(440, 60, 50, 0);
///
/// let pcm = apu.write_samples(1024);
/// assert_eq!(pcm.len(), 2048);
/// ```
#[derive(Clone)]
pub struct Apu {
    channels: [Channel; NUM_CHANNELS],
    /// Global sample time, advanced once per stereo frame
    time: u64,
    config: ApuConfig,
}

impl Apu {
    /// Create an engine at 44.1 kHz with the default voice levels
    pub fn new() -> Self {
        Self::build(ApuConfig::default())
    }

    /// Create an engine from a validated configuration
    pub fn with_config(config: ApuConfig) -> Result<Self> {
        config.validate()?;
        tracing::debug!(
            sample_rate = config.sample_rate,
            max_volume = config.max_volume,
            max_volume_triangle = config.max_volume_triangle,
            "configured apu"
        );
        Ok(Self::build(config))
    }

    fn build(config: ApuConfig) -> Self {
        Apu {
            channels: std::array::from_fn(Channel::new),
            time: 0,
            config,
        }
    }

    // ========================================================================
    // Tone commands
    // ========================================================================

    /// Start a tone from the four packed command words.
    ///
    /// Every input is masked or clamped; no value is rejected.
    pub fn tone(&mut self, frequency: u32, duration: u32, volume: u32, flags: u32) {
        self.play(&ToneCommand::decode(frequency, duration, volume, flags));
    }

    /// Start an already-decoded tone on the voice it names
    pub fn play(&mut self, cmd: &ToneCommand) {
        let index = (cmd.channel & 0x03) as usize;
        tracing::trace!(
            time = self.time,
            channel = index,
            freq1 = cmd.freq1,
            freq2 = cmd.freq2,
            "tone"
        );
        let max_volume = self.config.max_volume_for(index);
        self.channels[index].apply_tone(cmd, self.time, self.config.sample_rate, max_volume);
    }

    // ========================================================================
    // Synthesis
    // ========================================================================

    /// Render `frames` stereo frames as interleaved `[left, right, ...]`
    pub fn write_samples(&mut self, frames: usize) -> Vec<i16> {
        let mut output = vec![0; frames * 2];
        self.write_samples_into(&mut output);
        output
    }

    /// Render into `output`, one frame per interleaved pair.
    ///
    /// An odd trailing element is zeroed and does not advance the clock.
    pub fn write_samples_into(&mut self, output: &mut [i16]) {
        let mut frames = output.chunks_exact_mut(2);
        for frame in &mut frames {
            let (left, right) = self.tick();
            frame[0] = left;
            frame[1] = right;
        }
        for sample in frames.into_remainder() {
            *sample = 0;
        }
    }

    /// Mix one stereo frame and advance the clock
    #[inline]
    fn tick(&mut self) -> (i16, i16) {
        let time = self.time;
        let sample_rate = self.config.sample_rate;
        let mut mixer = StereoMixer::new();

        for channel in self.channels.iter_mut() {
            if channel.is_active(time) {
                let sample = channel.next_sample(time, sample_rate);
                mixer.add(sample, channel.pan());
            }
        }

        self.time += 1;
        mixer.output()
    }

    // ========================================================================
    // State access
    // ========================================================================

    /// Global sample time (number of frames rendered so far)
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Active configuration
    pub fn config(&self) -> &ApuConfig {
        &self.config
    }

    /// Voice at `index` (0-3)
    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    /// All four voices
    pub fn channels(&self) -> &[Channel; NUM_CHANNELS] {
        &self.channels
    }

    /// Whether any voice sounds at the current time
    pub fn is_playing(&self) -> bool {
        self.channels.iter().any(|ch| ch.is_active(self.time))
    }

    /// Snapshot of every voice at the current time
    pub fn channel_states(&self) -> ChannelStates {
        ChannelStates {
            time: self.time,
            channels: std::array::from_fn(|i| {
                ChannelState::capture(&self.channels[i], self.time, self.config.max_volume_for(i))
            }),
        }
    }

    /// Silence every voice, rewind the clock and reseed the noise voice
    pub fn reset(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.reset();
        }
        self.time = 0;
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Apu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Apu")
            .field("time", &self.time)
            .field("sample_rate", &self.config.sample_rate)
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::EnvelopePhase;
    use crate::command::Pan;

    #[test]
    fn test_new_is_silent() {
        let mut apu = Apu::new();
        assert_eq!(apu.time(), 0);
        assert!(!apu.is_playing());
        assert!(apu.write_samples(256).iter().all(|&s| s == 0));
        assert_eq!(apu.time(), 256);
    }

    #[test]
    fn test_with_config_validates() {
        assert!(Apu::with_config(ApuConfig::with_sample_rate(10)).is_err());
        let apu = Apu::with_config(ApuConfig::desktop()).unwrap();
        assert_eq!(apu.sample_rate(), 48_000);
    }

    #[test]
    fn test_tone_selects_channel_from_flags() {
        let mut apu = Apu::new();
        apu.tone(330, 30, 100, 0b01_00_10);
        let states = apu.channel_states();
        assert!(states.channels[2].active);
        assert_eq!(states.channels[2].pan, Pan::Left);
        assert_eq!(states.channels[2].frequency, 330);
        assert_eq!(states.active_channels().count(), 1);
    }

    #[test]
    fn test_odd_buffer_tail_is_zeroed() {
        let mut apu = Apu::new();
        apu.tone(440, 60, 100, 0);
        let mut buffer = [7i16; 5];
        apu.write_samples_into(&mut buffer);
        assert_eq!(buffer[4], 0);
        assert_eq!(apu.time(), 2);
    }

    #[test]
    fn test_voice_goes_idle_after_release() {
        let mut apu = Apu::new();
        // One tick of sustain: 735 samples
        apu.tone(440, 1, 100, 0);
        apu.write_samples(735);
        assert!(!apu.is_playing());
        assert_eq!(apu.channel_states().channels[0].phase, EnvelopePhase::Idle);
        assert!(apu.write_samples(64).iter().all(|&s| s == 0));
    }

    #[test]
    fn test_reset() {
        let mut apu = Apu::new();
        apu.tone(1000, 60, 100, 3);
        apu.write_samples(100);
        apu.reset();
        assert_eq!(apu.time(), 0);
        assert!(!apu.is_playing());
        assert_eq!(apu.channel(3).and_then(|ch| ch.noise()).map(|n| n.seed()), Some(1));
    }

    #[test]
    fn test_channel_out_of_range() {
        let apu = Apu::new();
        assert!(apu.channel(4).is_none());
        assert!(apu.channel(3).is_some());
    }

    #[test]
    fn test_debug_output() {
        let apu = Apu::new();
        let debug = format!("{apu:?}");
        assert!(debug.contains("Apu"));
        assert!(debug.contains("44100"));
    }
}
