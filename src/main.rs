//! `chiptone` command-line front end
//!
//! Renders tone scripts and single tones to WAV, prints decoded script
//! timelines, and (with the `streaming` feature) plays scripts live.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use chiptone::export::{export_to_wav_with_config, ExportConfig};
use chiptone::{Apu, ApuConfig, Pan, TimeUnit, ToneCommand, ToneScript};

#[derive(Parser)]
#[command(name = "chiptone")]
#[command(about = "Four-voice chiptune sound chip: render, inspect and play tone scripts")]
#[command(version)]
struct Cli {
    /// Engine configuration (JSON: sample_rate, max_volume, max_volume_triangle)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a JSON tone script to a WAV file
    Render {
        /// Tone script to render
        script: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Render a single tone command to a WAV file
    Tone {
        #[command(flatten)]
        tone: ToneArgs,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Print the decoded timeline of a script and the voice states at each event
    Inspect {
        /// Tone script to inspect
        script: PathBuf,

        /// Print voice states as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a tone script on the default audio device
    #[cfg(feature = "streaming")]
    Play {
        /// Tone script to play
        script: PathBuf,
    },
}

#[derive(Args)]
struct ExportArgs {
    /// Seconds of silence appended at the end
    #[arg(long, default_value_t = 0.0)]
    tail: f32,

    /// Fade out over the last N seconds
    #[arg(long, default_value_t = 0.0)]
    fade: f32,

    /// Normalize the peak level
    #[arg(long)]
    normalize: bool,
}

impl ExportArgs {
    fn config(&self) -> ExportConfig {
        ExportConfig::default()
            .tail(self.tail)
            .fade_out(self.fade)
            .normalize(self.normalize)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PanArg {
    Center,
    Left,
    Right,
}

impl From<PanArg> for Pan {
    fn from(pan: PanArg) -> Self {
        match pan {
            PanArg::Center => Pan::Center,
            PanArg::Left => Pan::Left,
            PanArg::Right => Pan::Right,
        }
    }
}

#[derive(Args)]
struct ToneArgs {
    /// Packed command words: FREQUENCY DURATION VOLUME FLAGS (overrides the other tone options)
    #[arg(long, num_args = 4, value_names = ["FREQUENCY", "DURATION", "VOLUME", "FLAGS"])]
    packed: Option<Vec<u32>>,

    /// Voice: 0-1 pulse, 2 triangle, 3 noise
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    channel: u8,

    /// Start frequency in Hz
    #[arg(long, default_value_t = 440)]
    freq: u16,

    /// End frequency in Hz for a sweep
    #[arg(long, default_value_t = 0)]
    sweep_to: u16,

    /// Attack in 60 Hz ticks
    #[arg(long, default_value_t = 0)]
    attack: u8,

    /// Decay in 60 Hz ticks
    #[arg(long, default_value_t = 0)]
    decay: u8,

    /// Sustain in 60 Hz ticks
    #[arg(long, default_value_t = 30)]
    sustain: u8,

    /// Release in 60 Hz ticks
    #[arg(long, default_value_t = 0)]
    release: u8,

    /// Sustain level in percent
    #[arg(long, default_value_t = 100)]
    volume: u8,

    /// Peak level in percent (0 = full)
    #[arg(long, default_value_t = 0)]
    peak: u8,

    /// Mode bits (pulse duty: 0 = 12.5%, 2 = 50%, otherwise 25%)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=3))]
    mode: u8,

    /// Stereo placement
    #[arg(long, value_enum, default_value_t = PanArg::Center)]
    pan: PanArg,
}

impl ToneArgs {
    fn command(&self) -> ToneCommand {
        match self.packed.as_deref() {
            Some(&[frequency, duration, volume, flags]) => {
                ToneCommand::decode(frequency, duration, volume, flags)
            }
            _ => ToneCommand::new(self.channel, self.freq)
                .sweep_to(self.sweep_to)
                .adsr(self.attack, self.decay, self.sustain, self.release)
                .volume(self.volume, self.peak)
                .mode(self.mode)
                .pan(self.pan.into()),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            script,
            output,
            export,
        } => {
            let script = load_script(&script)?;
            render(&script, &output, config, &export)
        }
        Command::Tone {
            tone,
            output,
            export,
        } => {
            let cmd = tone.command();
            let (f, d, v, fl) = cmd.encode();
            println!("Tone: {:?}", cmd);
            println!("Packed: {} {:#010x} {:#06x} {:#04x}", f, d, v, fl);
            let mut script = ToneScript::new(TimeUnit::Frames);
            script.push(0, cmd);
            render(&script, &output, config, &export)
        }
        Command::Inspect { script, json } => {
            let script = load_script(&script)?;
            inspect(&script, config, json)
        }
        #[cfg(feature = "streaming")]
        Command::Play { script } => {
            let script = load_script(&script)?;
            play(&script, config)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ApuConfig> {
    match path {
        Some(path) => ApuConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ApuConfig::default()),
    }
}

fn load_script(path: &Path) -> Result<ToneScript> {
    ToneScript::from_json_file(path).with_context(|| format!("loading script {}", path.display()))
}

fn render(script: &ToneScript, output: &Path, config: ApuConfig, export: &ExportArgs) -> Result<()> {
    let mut apu = Apu::with_config(config)?;
    let frames = script.duration_frames(config.sample_rate)?;
    println!(
        "Rendering {} events, {:.2}s at {} Hz",
        script.events.len(),
        frames as f32 / config.sample_rate as f32,
        config.sample_rate
    );
    export_to_wav_with_config(&mut apu, script, output, export.config())
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn inspect(script: &ToneScript, config: ApuConfig, json: bool) -> Result<()> {
    let mut apu = Apu::with_config(config)?;
    let sample_rate = config.sample_rate;
    let timeline = script.timeline(sample_rate)?;
    let total = script.duration_frames(sample_rate)?;
    if timeline.is_empty() {
        bail!("script has no events");
    }

    for timed in &timeline {
        let pending = timed.frame.saturating_sub(apu.time());
        apu.write_samples(pending as usize);
        apu.play(&timed.command);

        let cmd = &timed.command;
        let (f, d, v, fl) = cmd.encode();
        println!(
            "frame {:>8} ({:>7.3}s)  ch{} {:>5} Hz -> {:>5} Hz  adsr {}/{}/{}/{}  vol {}/{}  mode {}  pan {:?}  [{} {:#010x} {:#06x} {:#04x}]",
            timed.frame,
            timed.frame as f32 / sample_rate as f32,
            cmd.channel,
            cmd.freq1,
            cmd.freq2,
            cmd.attack,
            cmd.decay,
            cmd.sustain,
            cmd.release,
            cmd.sustain_volume,
            cmd.peak_volume,
            cmd.mode,
            cmd.pan_position(),
            f,
            d,
            v,
            fl
        );

        let states = apu.channel_states();
        if json {
            println!("{}", serde_json::to_string(&states)?);
            continue;
        }
        for (index, state) in states.active_channels() {
            let note = state
                .note
                .map(|n| n.to_string())
                .unwrap_or_else(|| "--".to_string());
            println!(
                "    ch{} {:<8} {:<7} {:>5} Hz {:>4} vol {:>6}  {:?}  ends in {} frames",
                index,
                format!("{:?}", state.kind),
                format!("{:?}", state.phase),
                state.frequency,
                note,
                state.volume,
                state.pan,
                state.remaining_samples
            );
        }
    }

    println!(
        "total {} frames ({:.3}s)",
        total,
        total as f32 / sample_rate as f32
    );
    Ok(())
}

#[cfg(feature = "streaming")]
fn play(script: &ToneScript, config: ApuConfig) -> Result<()> {
    use std::time::Duration;

    use chiptone::{AudioDevice, SharedApu};

    let apu = SharedApu::with_config(config)?;
    let timeline = script.timeline(config.sample_rate)?;
    let total = script.duration_frames(config.sample_rate)?;

    // Commands land on the next rendered batch after their frame
    let device = AudioDevice::new(apu.clone())?;
    println!(
        "Playing {} events ({:.2}s), Ctrl+C to stop",
        timeline.len(),
        total as f32 / config.sample_rate as f32
    );

    let start = apu.time();
    for timed in &timeline {
        while apu.time() - start < timed.frame {
            std::thread::sleep(Duration::from_millis(1));
        }
        apu.play(&timed.command);
    }
    while apu.time() - start < total {
        std::thread::sleep(Duration::from_millis(5));
    }

    device.stop();
    Ok(())
}
