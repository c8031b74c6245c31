// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! Records one sample per key by playing notes through a MIDI output while
//! capturing an audio input, then builds a preset out of the recordings.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use midly::num::{u4, u7};
use tracing::{error, info, span, warn, Level};

use crate::audio::{self, CaptureError, CaptureRequest};
use crate::device::DeviceError;
use crate::filename::{sanitize_name, SampleEntry};
use crate::keyrange::{self, AssignError, AssignInput, LoopOverride};
use crate::midi;
use crate::notes::MidiKey;
use crate::preset::{self, PresetError, PresetTemplate};
use crate::util::duration_frames;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("start key {start} is above end key {end}")]
    InvalidKeyRange { start: MidiKey, end: MidiKey },

    #[error("the interval between keys must be at least one semitone")]
    InvalidInterval,

    #[error("the record duration must be longer than zero")]
    InvalidDuration,

    #[error("input channel {channel} is out of range (device has {available})")]
    InvalidChannel { channel: u16, available: u16 },

    #[error("the preset name is empty")]
    EmptyName,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Preset(#[from] PresetError),
}

/// Everything a recording session needs to know.
#[derive(Debug, Clone)]
pub struct RecordSettings {
    pub preset_name: String,
    pub output: PathBuf,
    /// Zero-based MIDI channel the notes are sent on.
    pub midi_channel: u4,
    /// Audio input channels to capture, numbered from 1.
    pub audio_channels: Vec<u16>,
    pub start_key: MidiKey,
    pub end_key: MidiKey,
    /// Semitones between recorded keys.
    pub interval: u8,
    /// How long to record each key.
    pub duration: Duration,
    pub sample_rate: u32,
    pub velocity: u7,
    /// Wait between arming the capture and sending the note.
    pub pre_roll: Duration,
    /// How long the note is held.
    pub sustain: Duration,
    pub loop_start: Option<Duration>,
    pub loop_end: Option<Duration>,
    pub loop_crossfade: Option<Duration>,
    /// The base preset template. The embedded one is used if not set.
    pub template: Option<PathBuf>,
}

impl RecordSettings {
    /// The keys to record, in order.
    pub fn keys(&self) -> Result<Vec<MidiKey>, RecordError> {
        key_sequence(self.start_key, self.end_key, self.interval)
    }

    fn loops(&self) -> LoopOverride {
        let frames = |duration: Duration| duration_frames(duration, self.sample_rate);
        LoopOverride {
            start: self.loop_start.map(frames),
            end: self.loop_end.map(frames),
            crossfade: self.loop_crossfade.map(frames).unwrap_or(0),
        }
    }
}

/// A key that could not be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedKey {
    pub key: MidiKey,
    pub reason: String,
}

/// The outcome of a recording session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub preset_directory: PathBuf,
    pub regions: usize,
    pub skipped: Vec<SkippedKey>,
}

/// The keys from start to end inclusive, `interval` semitones apart.
pub fn key_sequence(
    start: MidiKey,
    end: MidiKey,
    interval: u8,
) -> Result<Vec<MidiKey>, RecordError> {
    if interval == 0 {
        return Err(RecordError::InvalidInterval);
    }
    if start > end {
        return Err(RecordError::InvalidKeyRange { start, end });
    }
    Ok((start.as_u8()..=end.as_u8())
        .step_by(usize::from(interval))
        .filter_map(|value| MidiKey::new(i32::from(value)))
        .collect())
}

/// Picks the input channels to capture. Devices with more than two inputs use
/// the requested pair, stereo devices use both inputs and mono devices record
/// their single input on both channels.
pub fn channel_mapping(
    max_input_channels: u16,
    requested: Option<(u16, u16)>,
) -> Result<Vec<u16>, RecordError> {
    match max_input_channels {
        0 | 1 => Ok(vec![1, 1]),
        2 => Ok(vec![1, 2]),
        available => {
            let (left, right) = requested.unwrap_or((1, 2));
            for channel in [left, right] {
                if channel == 0 || channel > available {
                    return Err(RecordError::InvalidChannel { channel, available });
                }
            }
            Ok(vec![left, right])
        }
    }
}

/// The file a key is recorded to.
pub fn sample_filename(preset_name: &str, key: MidiKey) -> String {
    format!("{}-{:03}.wav", preset_name, key.as_u8())
}

/// Drives a MIDI output and an audio input to record samples.
pub struct Recorder {
    midi: Arc<dyn midi::Device>,
    audio: Arc<dyn audio::Device>,
}

impl Recorder {
    pub fn new(midi: Arc<dyn midi::Device>, audio: Arc<dyn audio::Device>) -> Recorder {
        Recorder { midi, audio }
    }

    /// Records every key in the settings, one at a time, and writes the preset.
    /// Keys that fail to capture are skipped. MIDI failures end the session.
    pub fn record(&self, settings: &RecordSettings) -> Result<RecordReport, RecordError> {
        let span = span!(Level::INFO, "record");
        let _enter = span.enter();

        let keys = settings.keys()?;
        if settings.duration.is_zero() {
            return Err(RecordError::InvalidDuration);
        }
        let preset_name = sanitize_name(&settings.preset_name).trim().to_string();
        if preset_name.is_empty() {
            return Err(RecordError::EmptyName);
        }
        if settings.pre_roll.saturating_add(settings.sustain) > settings.duration {
            warn!(
                duration = format!("{:?}", settings.duration),
                pre_roll = format!("{:?}", settings.pre_roll),
                sustain = format!("{:?}", settings.sustain),
                "The note will still be held when the capture ends."
            );
        }

        let template = PresetTemplate::load(settings.template.as_deref())?;
        let preset_directory = preset::create_preset_directory(&settings.output, &preset_name)?;
        info!(
            preset = preset_name,
            midi = self.midi.name(),
            audio = self.audio.name(),
            keys = keys.len(),
            "Recording preset."
        );

        let mut inputs: Vec<AssignInput> = Vec::with_capacity(keys.len());
        let mut skipped: Vec<SkippedKey> = Vec::new();
        for key in keys {
            let filename = sample_filename(&preset_name, key);
            let path = preset_directory.join(&filename);
            match self.record_key(settings, key, &path) {
                Ok(frame_count) => inputs.push(AssignInput {
                    entry: SampleEntry {
                        base_name: preset_name.clone(),
                        key,
                        source_path: path,
                        sanitized_filename: filename,
                        velocity: None,
                    },
                    frame_count,
                    sample_start: None,
                    loops: settings.loops(),
                }),
                Err(KeyError::Capture(e)) => {
                    error!(key = key.as_u8(), err = e.to_string(), "Skipping key.");
                    skipped.push(SkippedKey {
                        key,
                        reason: e.to_string(),
                    });
                }
                Err(KeyError::Device(e)) => return Err(e.into()),
            }
        }

        let ranges = keyrange::assign(inputs)?;
        let manifest = preset::assemble(&template, &ranges)?;
        manifest.write(&preset_directory)?;
        info!(
            preset = preset_name,
            regions = ranges.len(),
            skipped = skipped.len(),
            "Preset written."
        );

        Ok(RecordReport {
            preset_directory,
            regions: ranges.len(),
            skipped,
        })
    }

    /// Records a single key to the given path and returns its frame count.
    fn record_key(
        &self,
        settings: &RecordSettings,
        key: MidiKey,
        path: &Path,
    ) -> Result<u64, KeyError> {
        info!(
            key = key.as_u8(),
            file = path.display().to_string(),
            "Recording note."
        );
        let request = CaptureRequest {
            sample_rate: settings.sample_rate,
            channels: settings.audio_channels.clone(),
            frames: duration_frames(settings.duration, settings.sample_rate) as usize,
        };
        let capture = self.audio.start_capture(&request)?;

        spin_sleep::sleep(settings.pre_roll);
        self.midi
            .emit(midi::note_on(settings.midi_channel, key, settings.velocity))?;
        spin_sleep::sleep(settings.sustain);
        self.midi
            .emit(midi::note_off(settings.midi_channel, key))?;

        let recording = capture.finish()?;
        recording.write(path)?;
        Ok(recording.frame_count() as u64)
    }
}

/// Failures while recording one key. Capture failures skip the key, device
/// failures end the session.
enum KeyError {
    Capture(CaptureError),
    Device(DeviceError),
}

impl From<CaptureError> for KeyError {
    fn from(e: CaptureError) -> KeyError {
        KeyError::Capture(e)
    }
}

impl From<DeviceError> for KeyError {
    fn from(e: DeviceError) -> KeyError {
        KeyError::Device(e)
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs};

    use hound::WavReader;
    use serde_json::Value;
    use tempfile::tempdir;

    use super::*;
    use crate::audio::mock as audio_mock;
    use crate::midi::mock as midi_mock;
    use crate::preset::MANIFEST_FILE;

    fn key(value: i32) -> MidiKey {
        MidiKey::new(value).expect("valid key")
    }

    fn settings(output: &Path) -> RecordSettings {
        RecordSettings {
            preset_name: "Synth".to_string(),
            output: output.to_path_buf(),
            midi_channel: u4::new(2),
            audio_channels: vec![1, 2],
            start_key: key(60),
            end_key: key(64),
            interval: 2,
            duration: Duration::from_millis(100),
            sample_rate: 1000,
            velocity: u7::new(112),
            pre_roll: Duration::ZERO,
            sustain: Duration::from_millis(1),
            loop_start: None,
            loop_end: None,
            loop_crossfade: None,
            template: None,
        }
    }

    #[test]
    fn keys_step_by_interval() -> Result<(), RecordError> {
        assert_eq!(key_sequence(key(60), key(64), 2)?, vec![key(60), key(62), key(64)]);
        assert_eq!(key_sequence(key(60), key(65), 2)?, vec![key(60), key(62), key(64)]);
        assert_eq!(key_sequence(key(0), key(127), 127)?, vec![key(0), key(127)]);
        assert_eq!(key_sequence(key(72), key(72), 12)?, vec![key(72)]);
        assert!(matches!(
            key_sequence(key(60), key(64), 0),
            Err(RecordError::InvalidInterval)
        ));
        assert!(matches!(
            key_sequence(key(64), key(60), 1),
            Err(RecordError::InvalidKeyRange { .. })
        ));
        Ok(())
    }

    #[test]
    fn channel_mappings() -> Result<(), RecordError> {
        assert_eq!(channel_mapping(1, None)?, vec![1, 1]);
        assert_eq!(channel_mapping(2, Some((3, 4)))?, vec![1, 2]);
        assert_eq!(channel_mapping(8, Some((5, 6)))?, vec![5, 6]);
        assert_eq!(channel_mapping(8, None)?, vec![1, 2]);
        assert!(matches!(
            channel_mapping(4, Some((1, 5))),
            Err(RecordError::InvalidChannel {
                channel: 5,
                available: 4
            })
        ));
        Ok(())
    }

    #[test]
    fn filenames_are_zero_padded() {
        assert_eq!(sample_filename("Synth", key(7)), "Synth-007.wav");
        assert_eq!(sample_filename("Synth", key(127)), "Synth-127.wav");
    }

    #[test]
    fn record_session() -> Result<(), Box<dyn Error>> {
        let output = tempdir()?;
        let midi = midi_mock::Device::get("mock-midi");
        let audio = audio_mock::Device::get("mock-audio", 2);
        let recorder = Recorder::new(Arc::new(midi.clone()), Arc::new(audio.clone()));

        let report = recorder.record(&settings(output.path()))?;

        assert_eq!(report.preset_directory, output.path().join("Synth.preset"));
        assert_eq!(report.regions, 3);
        assert!(report.skipped.is_empty());

        assert_eq!(
            midi.emitted_events(),
            vec![
                vec![0x92, 60, 112],
                vec![0x82, 60, 0],
                vec![0x92, 62, 112],
                vec![0x82, 62, 0],
                vec![0x92, 64, 112],
                vec![0x82, 64, 0],
            ]
        );

        let requests = audio.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|request| request.frames == 100 && request.channels == vec![1, 2]));

        let reader = WavReader::open(report.preset_directory.join("Synth-062.wav"))?;
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 1000);
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.duration(), 100);

        let manifest: Value = serde_json::from_str(&fs::read_to_string(
            report.preset_directory.join(MANIFEST_FILE),
        )?)?;
        let regions = manifest["regions"].as_array().cloned().unwrap_or_default();
        let spans: Vec<(u64, u64, String)> = regions
            .iter()
            .map(|region| {
                (
                    region["lokey"].as_u64().unwrap_or(999),
                    region["hikey"].as_u64().unwrap_or(999),
                    region["sample"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        assert_eq!(
            spans,
            vec![
                (0, 60, "Synth-060.wav".to_string()),
                (61, 62, "Synth-062.wav".to_string()),
                (63, 127, "Synth-064.wav".to_string()),
            ]
        );
        assert_eq!(regions[0]["framecount"], 100);
        assert_eq!(regions[0]["loop.start"], 25);
        assert_eq!(regions[0]["loop.end"], 75);
        Ok(())
    }

    #[test]
    fn failed_captures_are_skipped() -> Result<(), Box<dyn Error>> {
        let output = tempdir()?;
        let midi = midi_mock::Device::get("mock-midi");
        let audio = audio_mock::Device::get("mock-audio", 2).fail_capture(1);
        let recorder = Recorder::new(Arc::new(midi.clone()), Arc::new(audio));

        let report = recorder.record(&settings(output.path()))?;

        assert_eq!(report.regions, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].key, key(62));
        assert!(!report.preset_directory.join("Synth-062.wav").exists());
        // The failed key never got as far as playing a note.
        assert_eq!(midi.emitted_events().len(), 4);
        Ok(())
    }

    #[test]
    fn loop_points_from_seconds() -> Result<(), Box<dyn Error>> {
        let output = tempdir()?;
        let recorder = Recorder::new(
            Arc::new(midi_mock::Device::get("mock-midi")),
            Arc::new(audio_mock::Device::get("mock-audio", 1)),
        );
        let settings = RecordSettings {
            end_key: key(60),
            audio_channels: vec![1, 1],
            loop_start: Some(Duration::from_millis(10)),
            loop_end: Some(Duration::from_millis(90)),
            loop_crossfade: Some(Duration::from_millis(5)),
            ..settings(output.path())
        };

        let report = recorder.record(&settings)?;

        let manifest: Value = serde_json::from_str(&fs::read_to_string(
            report.preset_directory.join(MANIFEST_FILE),
        )?)?;
        let region = &manifest["regions"][0];
        assert_eq!(region["loop.start"], 10);
        assert_eq!(region["loop.end"], 90);
        assert_eq!(region["loop.crossfade"], 5);
        assert_eq!(region["lokey"], 0);
        assert_eq!(region["hikey"], 127);
        Ok(())
    }

    #[test]
    fn invalid_sessions() -> Result<(), Box<dyn Error>> {
        let output = tempdir()?;
        let recorder = Recorder::new(
            Arc::new(midi_mock::Device::get("mock-midi")),
            Arc::new(audio_mock::Device::get("mock-audio", 2)),
        );

        let empty_name = RecordSettings {
            preset_name: "???".to_string(),
            ..settings(output.path())
        };
        assert!(matches!(
            recorder.record(&empty_name),
            Err(RecordError::EmptyName)
        ));

        let no_duration = RecordSettings {
            duration: Duration::ZERO,
            ..settings(output.path())
        };
        assert!(matches!(
            recorder.record(&no_duration),
            Err(RecordError::InvalidDuration)
        ));

        let all_failing = audio_mock::Device::get("mock-audio", 2)
            .fail_capture(0)
            .fail_capture(1)
            .fail_capture(2);
        let recorder = Recorder::new(
            Arc::new(midi_mock::Device::get("mock-midi")),
            Arc::new(all_failing),
        );
        assert!(matches!(
            recorder.record(&settings(output.path())),
            Err(RecordError::Assign(AssignError::EmptyInput))
        ));
        Ok(())
    }

    #[test]
    fn huge_timings_do_not_overflow() -> Result<(), Box<dyn Error>> {
        let output = tempdir()?;
        // Every capture fails to start, so nothing sleeps.
        let all_failing = audio_mock::Device::get("mock-audio", 2)
            .fail_capture(0)
            .fail_capture(1)
            .fail_capture(2);
        let recorder = Recorder::new(
            Arc::new(midi_mock::Device::get("mock-midi")),
            Arc::new(all_failing),
        );
        let huge = RecordSettings {
            pre_roll: Duration::MAX,
            sustain: Duration::MAX,
            ..settings(output.path())
        };
        assert!(matches!(
            recorder.record(&huge),
            Err(RecordError::Assign(AssignError::EmptyInput))
        ));
        Ok(())
    }
}
