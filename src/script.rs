//! Tone scripts
//!
//! A tone script is a JSON document listing tone commands and the time at
//! which each one starts:
//!
//! ```json
//! {
//!   "unit": "ticks",
//!   "tail": 30,
//!   "events": [
//!     { "at": 0,  "tone": { "channel": 0, "freq1": 440, "sustain": 20, "release": 10, "sustain_volume": 80 } },
//!     { "at": 30, "packed": [523, 30, 100, 2] }
//!   ]
//! }
//! ```
//!
//! Event times and the tail use the script's `unit`: 60 Hz ticks (default)
//! or sample frames. Events are played in time order; events sharing a time
//! keep their listed order.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::ApuBackend;
use crate::command::ToneCommand;
use crate::constants::{samples_per_millisecond, ticks_to_samples, TICKS_PER_SECOND};
use crate::{ChiptoneError, Result};

/// Unit of event times in a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// 60 Hz ticks, the unit of envelope durations
    #[default]
    Ticks,
    /// Output sample frames
    Frames,
}

/// Longest render a script may produce, in seconds of output
pub const MAX_RENDER_SECONDS: u64 = 60 * 60;

impl TimeUnit {
    /// Convert `value` in this unit to frames at `sample_rate`.
    ///
    /// Fails with `ScriptError` when the frame count does not fit in a `u64`.
    pub fn to_frames(self, value: u64, sample_rate: u32) -> Result<u64> {
        match self {
            TimeUnit::Ticks => (sample_rate as u64)
                .checked_mul(value)
                .map(|scaled| scaled / TICKS_PER_SECOND)
                .ok_or_else(|| {
                    ChiptoneError::ScriptError(format!("time {} ticks is out of range", value))
                }),
            TimeUnit::Frames => Ok(value),
        }
    }
}

/// One timed tone command.
///
/// Exactly one of `tone` (typed fields) or `packed` (the four command
/// words) must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEvent {
    /// Start time in the script's unit
    pub at: u64,
    /// Typed command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneCommand>,
    /// Packed `[frequency, duration, volume, flags]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packed: Option<[u32; 4]>,
}

impl ScriptEvent {
    /// Event carrying a typed command
    pub fn tone(at: u64, cmd: ToneCommand) -> Self {
        ScriptEvent {
            at,
            tone: Some(cmd),
            packed: None,
        }
    }

    /// Event carrying packed command words
    pub fn packed(at: u64, frequency: u32, duration: u32, volume: u32, flags: u32) -> Self {
        ScriptEvent {
            at,
            tone: None,
            packed: Some([frequency, duration, volume, flags]),
        }
    }

    /// Decoded command of this event
    pub fn command(&self) -> Result<ToneCommand> {
        match (&self.tone, &self.packed) {
            (Some(cmd), None) => Ok(*cmd),
            (None, Some([f, d, v, fl])) => Ok(ToneCommand::decode(*f, *d, *v, *fl)),
            (Some(_), Some(_)) => Err(ChiptoneError::ScriptError(format!(
                "event at {} has both 'tone' and 'packed'",
                self.at
            ))),
            (None, None) => Err(ChiptoneError::ScriptError(format!(
                "event at {} has neither 'tone' nor 'packed'",
                self.at
            ))),
        }
    }
}

/// A command resolved to its start frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedCommand {
    /// Start frame relative to the start of the render
    pub frame: u64,
    /// Decoded command
    pub command: ToneCommand,
}

impl TimedCommand {
    /// Frame at which the voice goes idle again
    pub fn end_frame(&self, sample_rate: u32) -> Result<u64> {
        let cmd = &self.command;
        let mut length = [cmd.attack, cmd.decay, cmd.sustain, cmd.release]
            .iter()
            .map(|&ticks| ticks_to_samples(sample_rate, ticks))
            .sum::<u64>();
        if cmd.channel & 0x03 == 2 && cmd.release == 0 {
            length += samples_per_millisecond(sample_rate);
        }
        self.frame.checked_add(length).ok_or_else(|| {
            ChiptoneError::ScriptError(format!("event at frame {} ends out of range", self.frame))
        })
    }
}

/// Timed list of tone commands
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToneScript {
    /// Unit of `at` and `tail`
    #[serde(default)]
    pub unit: TimeUnit,
    /// Silence rendered after the last voice goes idle
    #[serde(default)]
    pub tail: u64,
    /// Events in any order
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl ToneScript {
    /// Empty script in the given unit
    pub fn new(unit: TimeUnit) -> Self {
        ToneScript {
            unit,
            ..Default::default()
        }
    }

    /// Append a typed command at `at`
    pub fn push(&mut self, at: u64, cmd: ToneCommand) -> &mut Self {
        self.events.push(ScriptEvent::tone(at, cmd));
        self
    }

    /// Set the trailing silence
    pub fn with_tail(mut self, tail: u64) -> Self {
        self.tail = tail;
        self
    }

    /// Parse a JSON script
    pub fn from_json_str(json: &str) -> Result<Self> {
        let script: ToneScript = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Load a JSON script from disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json).map_err(|e| match e {
            ChiptoneError::Json(err) => {
                ChiptoneError::ScriptError(format!("{}: {}", path.display(), err))
            }
            other => other,
        })
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every event decodes
    pub fn validate(&self) -> Result<()> {
        for event in &self.events {
            event.command()?;
        }
        Ok(())
    }

    /// Commands resolved to frames and sorted by start time (stable)
    pub fn timeline(&self, sample_rate: u32) -> Result<Vec<TimedCommand>> {
        let mut timeline = self
            .events
            .iter()
            .map(|event| {
                Ok(TimedCommand {
                    frame: self.unit.to_frames(event.at, sample_rate)?,
                    command: event.command()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        timeline.sort_by_key(|timed| timed.frame);
        Ok(timeline)
    }

    /// Total render length in frames: last voice end plus the tail.
    ///
    /// Scripts longer than [`MAX_RENDER_SECONDS`] are rejected with
    /// `ScriptError`.
    pub fn duration_frames(&self, sample_rate: u32) -> Result<u64> {
        let mut end = 0;
        for timed in self.timeline(sample_rate)? {
            end = end.max(timed.end_frame(sample_rate)?);
        }
        let total = end
            .checked_add(self.unit.to_frames(self.tail, sample_rate)?)
            .ok_or_else(|| ChiptoneError::ScriptError("script length is out of range".to_string()))?;

        let limit = MAX_RENDER_SECONDS * sample_rate as u64;
        if total > limit {
            return Err(ChiptoneError::ScriptError(format!(
                "script renders {} frames, more than the {} s limit ({} frames at {} Hz)",
                total, MAX_RENDER_SECONDS, limit, sample_rate
            )));
        }
        Ok(total)
    }

    /// Play the script on `backend` and return the rendered interleaved PCM.
    ///
    /// Each command is issued exactly at its start frame, counted from the
    /// backend's clock when the render begins.
    pub fn render<B: ApuBackend + ?Sized>(&self, backend: &mut B) -> Result<Vec<i16>> {
        let sample_rate = backend.sample_rate();
        let timeline = self.timeline(sample_rate)?;
        let total = self.duration_frames(sample_rate)?;
        tracing::debug!(
            events = timeline.len(),
            frames = total,
            sample_rate,
            "rendering tone script"
        );

        let mut output = Vec::with_capacity(total as usize * 2);
        let mut cursor = 0u64;
        for timed in &timeline {
            if timed.frame > cursor {
                backend.render_frames((timed.frame - cursor) as usize, &mut output);
                cursor = timed.frame;
            }
            backend.play(&timed.command);
        }
        if total > cursor {
            backend.render_frames((total - cursor) as usize, &mut output);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Apu;

    const SCRIPT: &str = r#"{
        "unit": "ticks",
        "tail": 6,
        "events": [
            { "at": 30, "packed": [523, 30, 100, 1] },
            { "at": 0, "tone": { "channel": 0, "freq1": 440, "sustain": 20, "release": 10 } }
        ]
    }"#;

    #[test]
    fn test_parse_and_sort() {
        let script = ToneScript::from_json_str(SCRIPT).unwrap();
        let timeline = script.timeline(44_100).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].frame, 0);
        assert_eq!(timeline[0].command.freq1, 440);
        assert_eq!(timeline[1].frame, 22_050);
        assert_eq!(timeline[1].command.channel, 1);
        assert_eq!(timeline[1].command.sustain, 30);
    }

    #[test]
    fn test_stable_order_for_equal_times() {
        let mut script = ToneScript::new(TimeUnit::Frames);
        script
            .push(10, ToneCommand::new(0, 100))
            .push(10, ToneCommand::new(0, 200))
            .push(5, ToneCommand::new(1, 300));
        let timeline = script.timeline(44_100).unwrap();
        let freqs: Vec<u16> = timeline.iter().map(|t| t.command.freq1).collect();
        assert_eq!(freqs, vec![300, 100, 200]);
    }

    #[test]
    fn test_duration() {
        let script = ToneScript::from_json_str(SCRIPT).unwrap();
        // Second event ends at 30 + 30 ticks, plus a 6 tick tail
        assert_eq!(script.duration_frames(44_100).unwrap(), 44_100 + 4_410);
    }

    #[test]
    fn test_triangle_end_includes_padding() {
        let timed = TimedCommand {
            frame: 100,
            command: ToneCommand::new(2, 220).adsr(0, 0, 1, 0),
        };
        assert_eq!(timed.end_frame(44_100).unwrap(), 100 + 735 + 44);
    }

    #[test]
    fn test_empty_script_renders_tail_only() {
        let script = ToneScript::new(TimeUnit::Frames).with_tail(50);
        let pcm = script.render(&mut Apu::new()).unwrap();
        assert_eq!(pcm.len(), 100);
        assert!(pcm.iter().all(|&s| s == 0));
    }

    #[test]
    fn test_render_matches_manual_playback() {
        let script = ToneScript::from_json_str(SCRIPT).unwrap();
        let pcm = script.render(&mut Apu::new()).unwrap();

        let mut apu = Apu::new();
        apu.play(&ToneCommand::new(0, 440).adsr(0, 0, 20, 10));
        let mut expected = apu.write_samples(22_050);
        apu.tone(523, 30, 100, 1);
        expected.extend(apu.write_samples(22_050 + 4_410));

        assert_eq!(pcm, expected);
    }

    #[test]
    fn test_event_needs_exactly_one_command() {
        let err = ToneScript::from_json_str(r#"{ "events": [ { "at": 0 } ] }"#).unwrap_err();
        assert!(matches!(err, ChiptoneError::ScriptError(_)));

        let both = r#"{ "events": [ { "at": 0, "tone": {}, "packed": [0, 0, 0, 0] } ] }"#;
        assert!(matches!(
            ToneScript::from_json_str(both).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));
    }

    #[test]
    fn test_huge_times_are_script_errors() {
        let at = r#"{ "events": [ { "at": 18446744073709551615, "packed": [440, 10, 100, 0] } ] }"#;
        let script = ToneScript::from_json_str(at).unwrap();
        assert!(matches!(
            script.timeline(44_100).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));
        assert!(matches!(
            script.duration_frames(44_100).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));
        assert!(matches!(
            script.render(&mut Apu::new()).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));

        let frames = r#"{ "unit": "frames", "events": [ { "at": 18446744073709551615, "packed": [440, 10, 100, 0] } ] }"#;
        let script = ToneScript::from_json_str(frames).unwrap();
        assert!(matches!(
            script.duration_frames(44_100).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));

        let tail = r#"{ "unit": "frames", "tail": 18446744073709551615, "events": [ { "at": 0, "packed": [440, 10, 100, 0] } ] }"#;
        let script = ToneScript::from_json_str(tail).unwrap();
        assert!(matches!(
            script.duration_frames(44_100).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));
    }

    #[test]
    fn test_render_length_is_capped() {
        let at_limit = ToneScript::new(TimeUnit::Frames).with_tail(MAX_RENDER_SECONDS * 44_100);
        assert_eq!(
            at_limit.duration_frames(44_100).unwrap(),
            MAX_RENDER_SECONDS * 44_100
        );

        let script = ToneScript::new(TimeUnit::Frames).with_tail(MAX_RENDER_SECONDS * 44_100 + 1);
        assert!(matches!(
            script.duration_frames(44_100).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));
        assert!(matches!(
            script.render(&mut Apu::new()).unwrap_err(),
            ChiptoneError::ScriptError(_)
        ));
    }

    #[test]
    fn test_out_of_range_volumes_in_json_are_clamped() {
        let loud = ToneScript::from_json_str(
            r#"{ "events": [ { "at": 0, "tone": { "channel": 0, "freq1": 440, "sustain": 10, "sustain_volume": 250, "peak_volume": 200 } } ] }"#,
        )
        .unwrap();
        let mut full = ToneScript::new(TimeUnit::Ticks);
        full.push(0, ToneCommand::new(0, 440).adsr(0, 0, 10, 0).volume(100, 100));

        let pcm = loud.render(&mut Apu::new()).unwrap();
        assert_eq!(pcm, full.render(&mut Apu::new()).unwrap());
        assert!(pcm.iter().all(|s| s.unsigned_abs() <= crate::constants::MAX_VOLUME as u16));
    }

    #[test]
    fn test_json_round_trip() {
        let mut script = ToneScript::new(TimeUnit::Frames).with_tail(10);
        script.push(0, ToneCommand::new(3, 1200).adsr(0, 4, 0, 8).volume(0, 100));
        script.events.push(ScriptEvent::packed(100, 440, 60, 50, 0));
        let json = script.to_json().unwrap();
        assert_eq!(ToneScript::from_json_str(&json).unwrap(), script);
    }
}
