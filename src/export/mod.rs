//! Audio export for rendered tone scripts
//!
//! # Example
//!
//! ```no_run
//! use chiptone::export::export_to_wav;
//! use chiptone::{Apu, ToneScript};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let script = ToneScript::from_json_file("jingle.json")?;
//! export_to_wav(&mut Apu::new(), &script, "jingle.wav")?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "export-wav")]
mod wav;
#[cfg(feature = "export-wav")]
pub use wav::*;

/// Export configuration options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportConfig {
    /// Extra silence appended after the script, in seconds
    pub tail_seconds: f32,
    /// Fade out duration at the end, in seconds (0 = no fade)
    pub fade_out_duration: f32,
    /// Scale the output so its peak sits just below full scale
    pub normalize: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            tail_seconds: 0.0,
            fade_out_duration: 0.0,
            normalize: false,
        }
    }
}

impl ExportConfig {
    /// Append `seconds` of silence
    pub fn tail(mut self, seconds: f32) -> Self {
        self.tail_seconds = seconds.max(0.0);
        self
    }

    /// Add fade out at the end
    pub fn fade_out(mut self, duration_seconds: f32) -> Self {
        self.fade_out_duration = duration_seconds.max(0.0);
        self
    }

    /// Enable peak normalization
    pub fn normalize(mut self, enable: bool) -> Self {
        self.normalize = enable;
        self
    }

    /// Whether the samples need a post-processing pass
    pub fn needs_post_processing(&self) -> bool {
        self.normalize || self.fade_out_duration > 0.0
    }

    /// Number of tail frames at `sample_rate`
    pub fn tail_frames(&self, sample_rate: u32) -> usize {
        (self.tail_seconds * sample_rate as f32) as usize
    }
}

/// Peak level targeted by normalization (95% of full scale)
#[cfg_attr(not(feature = "export-wav"), allow(dead_code))]
const NORMALIZE_PEAK: f32 = 0.95 * i16::MAX as f32;

/// Scale interleaved samples so the loudest one reaches [`NORMALIZE_PEAK`]
#[cfg_attr(not(feature = "export-wav"), allow(dead_code))]
pub(crate) fn normalize_samples(samples: &mut [i16]) {
    let peak = samples
        .iter()
        .map(|&s| (s as i32).abs())
        .max()
        .unwrap_or(0);
    if peak == 0 {
        return;
    }

    let scale = NORMALIZE_PEAK / peak as f32;
    for sample in samples.iter_mut() {
        *sample = (*sample as f32 * scale) as i16;
    }
}

/// Linearly fade the last `fade_duration` seconds of interleaved stereo audio
#[cfg_attr(not(feature = "export-wav"), allow(dead_code))]
pub(crate) fn apply_fade_out(samples: &mut [i16], fade_duration: f32, sample_rate: u32) {
    if fade_duration <= 0.0 || samples.is_empty() {
        return;
    }

    let frames = samples.len() / 2;
    let fade_frames = ((fade_duration * sample_rate as f32) as usize).min(frames);
    if fade_frames == 0 {
        return;
    }
    let start_fade = frames - fade_frames;

    for (i, frame) in samples.chunks_exact_mut(2).enumerate().skip(start_fade) {
        let progress = (i - start_fade + 1) as f32 / fade_frames as f32;
        let gain = 1.0 - progress;
        for sample in frame {
            *sample = (*sample as f32 * gain) as i16;
        }
    }
}
