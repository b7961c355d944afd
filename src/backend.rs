//! Backend trait abstraction for tone engines
//!
//! Script rendering, WAV export and real-time streaming only need to issue
//! tone commands and pull PCM. [`ApuBackend`] is that seam, implemented by the
//! owned [`Apu`](crate::Apu) and the lock-guarded [`SharedApu`](crate::SharedApu).

use crate::channel_state::ChannelStates;
use crate::command::ToneCommand;

/// Common interface for tone engines
///
/// # Example
///
/// ```
/// use chiptone::{Apu, ApuBackend, ToneCommand};
///
/// fn blip<B: ApuBackend>(engine: &mut B) -> Vec<i16> {
///     engine.play(&ToneCommand::new(0, 880).adsr(0, 2, 0, 4).volume(0, 100));
///     engine.write_samples(engine.sample_rate() as usize / 10)
/// }
///
/// let pcm = blip(&mut Apu::new());
/// assert_eq!(pcm.len(), 8820);
/// ```
pub trait ApuBackend: Send {
    /// Output sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Global sample time (frames rendered since creation or reset)
    fn time(&self) -> u64;

    /// Start a decoded tone on the voice it names
    fn play(&mut self, cmd: &ToneCommand);

    /// Start a tone from the four packed command words
    fn tone(&mut self, frequency: u32, duration: u32, volume: u32, flags: u32) {
        self.play(&ToneCommand::decode(frequency, duration, volume, flags));
    }

    /// Render interleaved stereo frames into a caller-provided buffer
    ///
    /// This avoids per-call allocations; prefer this in hot paths.
    fn write_samples_into(&mut self, output: &mut [i16]);

    /// Render `frames` stereo frames into a new buffer
    fn write_samples(&mut self, frames: usize) -> Vec<i16> {
        let mut output = vec![0; frames * 2];
        self.write_samples_into(&mut output);
        output
    }

    /// Append `frames` stereo frames to `output`
    fn render_frames(&mut self, frames: usize, output: &mut Vec<i16>) {
        let start = output.len();
        output.resize(start + frames * 2, 0);
        self.write_samples_into(&mut output[start..]);
    }

    /// Snapshot of every voice at the current time
    fn channel_states(&self) -> ChannelStates;

    /// Silence every voice and rewind the clock
    fn reset(&mut self);
}

impl ApuBackend for crate::Apu {
    fn sample_rate(&self) -> u32 {
        crate::Apu::sample_rate(self)
    }

    fn time(&self) -> u64 {
        crate::Apu::time(self)
    }

    fn play(&mut self, cmd: &ToneCommand) {
        crate::Apu::play(self, cmd)
    }

    fn write_samples_into(&mut self, output: &mut [i16]) {
        crate::Apu::write_samples_into(self, output)
    }

    fn channel_states(&self) -> ChannelStates {
        crate::Apu::channel_states(self)
    }

    fn reset(&mut self) {
        crate::Apu::reset(self)
    }
}
