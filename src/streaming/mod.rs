//! Real-time playback through the system audio device
//!
//! The device pulls PCM from a [`SharedApu`](crate::SharedApu) on rodio's
//! audio thread, so tone commands issued on the shared handle are heard at
//! the next batch boundary.

pub mod audio_device;

pub use audio_device::{ApuSource, AudioDevice};

/// Frames rendered per lock of the shared engine
pub const FRAMES_PER_BATCH: usize = 1024;
