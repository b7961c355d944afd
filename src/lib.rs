//! Four-voice chiptune sound chip
//!
//! A software sound chip with two pulse voices, a triangle voice and a noise
//! voice. Each voice has an attack/decay/sustain/release envelope and an
//! optional linear frequency sweep. Tone commands are four packed 32-bit
//! words; output is interleaved stereo 16-bit PCM at a configurable sample
//! rate.
//!
//! # Features
//! - Band-limited (PolyBLEP) pulse waves with 12.5%, 25% and 50% duty cycles
//! - Triangle voice with a 1 ms anti-pop release
//! - 16-bit LFSR noise voice
//! - Per-voice left/right/center routing with saturating mix
//! - Deterministic output: identical command streams render identical PCM,
//!   whatever the buffer sizes
//! - JSON tone scripts, WAV export and real-time playback
//!
//! # Crate feature flags
//! - `export-wav` (default): WAV export via `hound` (`export`)
//! - `cli` (default): `chiptone` command-line front end
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Core engine only
//! ```
//! use chiptone::{Apu, ToneCommand};
//!
//! let mut apu = Apu::new();
//!
//! // Packed form: 440 Hz, 30 ticks of sustain, 80% level, voice 0
//! apu.tone(440, 30, 80, 0);
//!
//! // Typed form: noise burst on voice 3
//! apu.play(&ToneCommand::new(3, 1500).adsr(0, 0, 2, 6).volume(100, 0));
//!
//! let pcm = apu.write_samples(735);
//! assert_eq!(pcm.len(), 1470);
//! ```
//!
//! ## Render a script to WAV
//! ```no_run
//! # #[cfg(feature = "export-wav")]
//! # {
//! use chiptone::{export::export_to_wav, Apu, ToneScript};
//! let script = ToneScript::from_json_file("jingle.json").unwrap();
//! export_to_wav(&mut Apu::new(), &script, "jingle.wav").unwrap();
//! # }
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use chiptone::{AudioDevice, SharedApu, ToneCommand};
//! let apu = SharedApu::default();
//! let _device = AudioDevice::new(apu.clone()).unwrap();
//! apu.play(&ToneCommand::new(0, 440).adsr(0, 0, 60, 20).volume(70, 0));
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! # }
//! ```

#![warn(missing_docs)]

pub mod apu;
pub mod backend;
pub mod channel;
pub mod channel_state;
pub mod command;
pub mod config;
pub mod constants;
pub mod export;
pub mod mixer;
pub mod noise;
pub mod ramp;
pub mod script;
pub mod shared;
#[cfg(feature = "streaming")]
pub mod streaming; // Audio Output & Streaming
pub mod waveform;

/// Error types for chiptone operations
#[derive(thiserror::Error, Debug)]
pub enum ChiptoneError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed tone script
    #[error("Script error: {0}")]
    ScriptError(String),

    /// JSON parse or encode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for ChiptoneError {
    /// Converts a String into `ChiptoneError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `ScriptError`, ...) where
    /// the failure has a known kind.
    fn from(msg: String) -> Self {
        ChiptoneError::Other(msg)
    }
}

impl From<&str> for ChiptoneError {
    /// Converts a string slice into `ChiptoneError::Other`.
    fn from(msg: &str) -> Self {
        ChiptoneError::Other(msg.to_string())
    }
}

/// Result type for chiptone operations
pub type Result<T> = std::result::Result<T, ChiptoneError>;

// Public API exports
pub use apu::Apu;
pub use backend::ApuBackend;
pub use channel::{Channel, ChannelKind, EnvelopePhase};
pub use channel_state::{ChannelState, ChannelStates, Note};
pub use command::{Pan, PanRouting, ToneCommand};
pub use config::ApuConfig;
pub use script::{ScriptEvent, TimeUnit, TimedCommand, ToneScript};
pub use shared::SharedApu;

pub use export::ExportConfig;
#[cfg(feature = "export-wav")]
pub use export::{export_samples_to_wav, export_to_wav, export_to_wav_with_config};
#[cfg(feature = "streaming")]
pub use streaming::{ApuSource, AudioDevice};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_string() {
        let err: ChiptoneError = "boom".into();
        assert!(matches!(err, ChiptoneError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_error_display() {
        let err = ChiptoneError::ConfigError("bad rate".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: bad rate");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ChiptoneError = io.into();
        assert!(matches!(err, ChiptoneError::Io(_)));
    }
}
