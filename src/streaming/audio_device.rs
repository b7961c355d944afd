//! Audio device integration using rodio

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rodio::{OutputStream, Sink, Source};

use super::FRAMES_PER_BATCH;
use crate::shared::SharedApu;
use crate::{ChiptoneError, Result};

/// rodio source rendering interleaved stereo frames from a shared engine
pub struct ApuSource {
    apu: SharedApu,
    finished: Arc<AtomicBool>,
    /// Batch of rendered samples, refilled under one lock
    buffer: Vec<i16>,
    buffer_pos: usize,
}

impl ApuSource {
    /// Create a source that stops when `finished` is set
    pub fn new(apu: SharedApu, finished: Arc<AtomicBool>) -> Self {
        let buffer = vec![0i16; FRAMES_PER_BATCH * 2];
        let buffer_pos = buffer.len();
        ApuSource {
            apu,
            finished,
            buffer,
            buffer_pos,
        }
    }
}

impl Source for ApuSource {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = self.buffer.len() - self.buffer_pos;
        Some(if remaining > 0 {
            remaining
        } else {
            self.buffer.len()
        })
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.apu.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Iterator for ApuSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }

        if self.buffer_pos >= self.buffer.len() {
            self.apu.write_samples_into(&mut self.buffer);
            self.buffer_pos = 0;
        }

        let sample = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some(sample)
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start playing `apu`
    pub fn new(apu: SharedApu) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            ChiptoneError::AudioDeviceError(format!("failed to create audio stream: {}", e))
        })?;
        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            ChiptoneError::AudioDeviceError(format!("failed to create audio sink: {}", e))
        })?;

        tracing::debug!(sample_rate = apu.sample_rate(), "opened audio device");

        let finished = Arc::new(AtomicBool::new(false));
        sink.append(ApuSource::new(apu, Arc::clone(&finished)));

        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }

    /// Pause playback
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback
    pub fn play(&self) {
        self.sink.play();
    }

    /// Whether playback is paused
    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    /// Whether the source is still producing samples
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Relaxed)
    }

    /// End the stream; the source yields no more samples
    pub fn stop(&self) {
        self.finished.store(true, Ordering::Relaxed);
        self.sink.stop();
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.stop();
    }
}
