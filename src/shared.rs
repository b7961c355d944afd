//! Thread-safe engine handle
//!
//! [`SharedApu`] wraps one [`Apu`] in an `Arc<Mutex<..>>` so a control thread
//! can issue tone commands while an audio thread renders. Every call takes the
//! lock for its whole duration: a tone command lands between two rendered
//! buffers, never inside one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::apu::Apu;
use crate::backend::ApuBackend;
use crate::channel_state::ChannelStates;
use crate::command::ToneCommand;
use crate::config::ApuConfig;
use crate::Result;

/// Cloneable, lock-guarded handle to an [`Apu`]
#[derive(Clone, Debug)]
pub struct SharedApu {
    inner: Arc<Mutex<Apu>>,
    sample_rate: u32,
}

impl SharedApu {
    /// Share an existing engine
    pub fn new(apu: Apu) -> Self {
        let sample_rate = apu.sample_rate();
        SharedApu {
            inner: Arc::new(Mutex::new(apu)),
            sample_rate,
        }
    }

    /// Create a shared engine from a validated configuration
    pub fn with_config(config: ApuConfig) -> Result<Self> {
        Ok(Self::new(Apu::with_config(config)?))
    }

    /// Start a tone from the four packed command words
    pub fn tone(&self, frequency: u32, duration: u32, volume: u32, flags: u32) {
        self.inner.lock().tone(frequency, duration, volume, flags);
    }

    /// Start a decoded tone
    pub fn play(&self, cmd: &ToneCommand) {
        self.inner.lock().play(cmd);
    }

    /// Render `frames` stereo frames
    pub fn write_samples(&self, frames: usize) -> Vec<i16> {
        self.inner.lock().write_samples(frames)
    }

    /// Render into a caller-provided interleaved buffer
    pub fn write_samples_into(&self, output: &mut [i16]) {
        self.inner.lock().write_samples_into(output);
    }

    /// Global sample time
    pub fn time(&self) -> u64 {
        self.inner.lock().time()
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Snapshot of every voice
    pub fn channel_states(&self) -> ChannelStates {
        self.inner.lock().channel_states()
    }

    /// Silence every voice and rewind the clock
    pub fn reset(&self) {
        self.inner.lock().reset();
    }

    /// Run `f` with exclusive access to the engine.
    ///
    /// Use this to issue several commands that must land on the same frame.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut Apu) -> R) -> R {
        let mut apu = self.inner.lock();
        f(&mut apu)
    }
}

impl From<Apu> for SharedApu {
    fn from(apu: Apu) -> Self {
        SharedApu::new(apu)
    }
}

impl Default for SharedApu {
    fn default() -> Self {
        SharedApu::new(Apu::new())
    }
}

impl ApuBackend for SharedApu {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn time(&self) -> u64 {
        SharedApu::time(self)
    }

    fn play(&mut self, cmd: &ToneCommand) {
        SharedApu::play(self, cmd)
    }

    fn write_samples_into(&mut self, output: &mut [i16]) {
        SharedApu::write_samples_into(self, output)
    }

    fn channel_states(&self) -> ChannelStates {
        SharedApu::channel_states(self)
    }

    fn reset(&mut self) {
        SharedApu::reset(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_state() {
        let shared = SharedApu::default();
        let other = shared.clone();
        other.tone(440, 60, 100, 0);
        assert!(shared.channel_states().channels[0].active);
        shared.write_samples(10);
        assert_eq!(other.time(), 10);
    }

    #[test]
    fn test_matches_owned_engine() {
        let mut owned = Apu::new();
        let shared = SharedApu::default();
        let cmd = ToneCommand::new(1, 660).adsr(2, 2, 10, 6).volume(60, 90).mode(2);
        owned.play(&cmd);
        shared.play(&cmd);
        assert_eq!(owned.write_samples(2048), shared.write_samples(2048));
    }

    #[test]
    fn test_commands_from_another_thread() {
        let shared = SharedApu::default();
        let control = shared.clone();
        let handle = thread::spawn(move || {
            control.play(&ToneCommand::new(3, 3000).adsr(0, 0, 30, 0).volume(100, 0));
        });
        handle.join().unwrap();

        let pcm = shared.write_samples(256);
        assert!(pcm.iter().any(|&s| s != 0));
    }

    #[test]
    fn test_with_lock_groups_commands() {
        let shared = SharedApu::default();
        let time = shared.with_lock(|apu| {
            apu.play(&ToneCommand::new(0, 262).adsr(0, 0, 10, 0));
            apu.play(&ToneCommand::new(1, 330).adsr(0, 0, 10, 0));
            apu.time()
        });
        assert_eq!(time, 0);
        assert_eq!(shared.channel_states().active_channels().count(), 2);
    }

    #[test]
    fn test_reset() {
        let shared = SharedApu::default();
        shared.tone(440, 60, 100, 0);
        shared.write_samples(64);
        shared.reset();
        assert_eq!(shared.time(), 0);
        assert!(shared.channel_states().is_silent());
    }
}
