//! WAV file export functionality

use std::path::Path;

use super::{apply_fade_out, normalize_samples, ExportConfig};
use crate::backend::ApuBackend;
use crate::script::ToneScript;
use crate::{ChiptoneError, Result};

/// Frames rendered per chunk on the streaming path
const FRAMES_PER_CHUNK: usize = 4096;

/// Render a tone script and write it as 16-bit stereo WAV
///
/// # Examples
///
/// ```no_run
/// use chiptone::export::export_to_wav;
/// use chiptone::{Apu, ToneCommand, ToneScript, TimeUnit};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut script = ToneScript::new(TimeUnit::Ticks);
/// script.push(0, ToneCommand::new(0, 440).adsr(2, 4, 20, 10).volume(60, 100));
///
/// export_to_wav(&mut Apu::new(), &script, "beep.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn export_to_wav<B, P>(backend: &mut B, script: &ToneScript, output_path: P) -> Result<()>
where
    B: ApuBackend + ?Sized,
    P: AsRef<Path>,
{
    export_to_wav_with_config(backend, script, output_path, ExportConfig::default())
}

/// Render a tone script and write it as WAV with custom post-processing
pub fn export_to_wav_with_config<B, P>(
    backend: &mut B,
    script: &ToneScript,
    output_path: P,
    config: ExportConfig,
) -> Result<()>
where
    B: ApuBackend + ?Sized,
    P: AsRef<Path>,
{
    let sample_rate = backend.sample_rate();
    let tail_frames = config.tail_frames(sample_rate);
    let path = output_path.as_ref();

    let mut samples = script.render(backend)?;
    tracing::info!(
        frames = samples.len() / 2 + tail_frames,
        seconds = (samples.len() / 2 + tail_frames) as f32 / sample_rate as f32,
        path = %path.display(),
        "exporting wav"
    );

    if config.needs_post_processing() {
        backend.render_frames(tail_frames, &mut samples);
        if config.normalize {
            tracing::debug!("normalizing audio");
            normalize_samples(&mut samples);
        }
        if config.fade_out_duration > 0.0 {
            tracing::debug!(seconds = config.fade_out_duration, "applying fade out");
            apply_fade_out(&mut samples, config.fade_out_duration, sample_rate);
        }
        export_samples_to_wav(&samples, sample_rate, path)
    } else {
        let mut writer = create_writer(path, sample_rate)?;
        write_all(&mut writer, &samples)?;
        write_streaming(&mut writer, backend, tail_frames)?;
        finalize(writer)
    }
}

/// Write already-rendered interleaved stereo samples as a WAV file
pub fn export_samples_to_wav<P: AsRef<Path>>(
    samples: &[i16],
    sample_rate: u32,
    output_path: P,
) -> Result<()> {
    let mut writer = create_writer(output_path.as_ref(), sample_rate)?;
    write_all(&mut writer, samples)?;
    finalize(writer)
}

type Writer = hound::WavWriter<std::io::BufWriter<std::fs::File>>;

fn create_writer(path: &Path, sample_rate: u32) -> Result<Writer> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    hound::WavWriter::create(path, spec).map_err(|e| {
        ChiptoneError::AudioFileError(format!(
            "failed to create WAV file {}: {}",
            path.display(),
            e
        ))
    })
}

fn write_all(writer: &mut Writer, samples: &[i16]) -> Result<()> {
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| ChiptoneError::AudioFileError(format!("failed to write sample: {}", e)))?;
    }
    Ok(())
}

/// Render `frames` more frames from `backend` in fixed-size chunks
fn write_streaming<B: ApuBackend + ?Sized>(
    writer: &mut Writer,
    backend: &mut B,
    frames: usize,
) -> Result<()> {
    let mut buffer = vec![0i16; FRAMES_PER_CHUNK * 2];
    let mut written = 0;
    while written < frames {
        let chunk = (frames - written).min(FRAMES_PER_CHUNK);
        let slice = &mut buffer[..chunk * 2];
        backend.write_samples_into(slice);
        write_all(writer, slice)?;
        written += chunk;
    }
    Ok(())
}

fn finalize(writer: Writer) -> Result<()> {
    writer
        .finalize()
        .map_err(|e| ChiptoneError::AudioFileError(format!("failed to finalize WAV file: {}", e)))
}
