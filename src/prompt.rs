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
//! Interactive questions for setting up a recording session.

use std::{
    fmt,
    io::{self, BufRead, Write},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use midly::num::{u4, u7};

use crate::audio;
use crate::config::{ConfigError, RecordDefaults};
use crate::midi::VIRTUAL_PORT_NAME;
use crate::notes::MidiKey;
use crate::record::{self, RecordError, RecordSettings};

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("input ended before the session was set up")]
    EndOfInput,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Asks questions on one stream and reads answers from another.
pub struct Prompter<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// A prompter on the terminal.
    pub fn stdio() -> Self {
        Prompter::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    /// Prints a line of text.
    pub fn say(&mut self, text: impl fmt::Display) -> Result<(), PromptError> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Asks a question and returns the trimmed answer.
    pub fn ask(&mut self, question: &str) -> Result<String, PromptError> {
        write!(self.output, "{} ", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(PromptError::EndOfInput);
        }
        Ok(line.trim().to_string())
    }

    /// Asks until the answer parses. An empty answer picks the default, if
    /// there is one.
    pub fn ask_with<T>(
        &mut self,
        question: &str,
        default: Option<T>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Result<T, PromptError> {
        let mut default = default;
        loop {
            let answer = self.ask(question)?;
            if answer.is_empty() {
                if let Some(default) = default.take() {
                    return Ok(default);
                }
            }
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(reason) => self.say(format!("Invalid answer: {}", reason))?,
            }
        }
    }

    /// Asks for any value that parses with `FromStr`.
    pub fn ask_parsed<T>(&mut self, question: &str, default: Option<T>) -> Result<T, PromptError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.ask_with(question, default, |answer| {
            answer.parse::<T>().map_err(|e| e.to_string())
        })
    }

    /// Waits for the user to press enter.
    pub fn confirm(&mut self, message: &str) -> Result<(), PromptError> {
        self.ask(message).map(|_| ())
    }
}

fn parse_index(answer: &str, count: usize) -> Result<usize, String> {
    let index = answer.parse::<usize>().map_err(|e| e.to_string())?;
    if index < count {
        Ok(index)
    } else {
        Err(format!("pick a number between 0 and {}", count.saturating_sub(1)))
    }
}

fn parse_seconds(answer: &str) -> Result<Duration, String> {
    let seconds = answer.parse::<f64>().map_err(|e| e.to_string())?;
    Duration::try_from_secs_f64(seconds).map_err(|_| format!("{} is not a valid number of seconds", seconds))
}

fn parse_optional_seconds(answer: &str) -> Result<Option<Duration>, String> {
    if answer.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse_seconds(answer).map(Some)
}

fn parse_ranged(answer: &str, low: u32, high: u32) -> Result<u32, String> {
    let value = answer.parse::<u32>().map_err(|e| e.to_string())?;
    if (low..=high).contains(&value) {
        Ok(value)
    } else {
        Err(format!("pick a number between {} and {}", low, high))
    }
}

fn parse_channel_pair(answer: &str) -> Result<(u16, u16), String> {
    let channels = answer
        .split(',')
        .map(|channel| channel.trim().parse::<u16>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<u16>, String>>()?;
    match channels.as_slice() {
        [left, right] => Ok((*left, *right)),
        _ => Err("specify exactly two channels".to_string()),
    }
}

fn describe(duration: Option<Duration>) -> String {
    duration
        .map(|duration| format!("{}", duration.as_secs_f64()))
        .unwrap_or_else(|| "none".to_string())
}

/// A recording session as chosen by the user.
pub struct Session {
    pub midi_device: usize,
    pub audio_device: usize,
    pub settings: RecordSettings,
}

/// Walks the user through choosing devices and recording parameters.
pub fn record_session<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    midi_devices: &[String],
    audio_devices: &[Box<dyn audio::Device>],
    defaults: &RecordDefaults,
    template: Option<PathBuf>,
) -> Result<Session, PromptError> {
    prompter.say("Welcome to the multisample recorder!")?;

    prompter.say("\nMIDI output devices:")?;
    for (index, name) in midi_devices.iter().enumerate() {
        prompter.say(format!("  {}: {}", index, name))?;
    }
    let midi_device = prompter.ask_with("Please select a MIDI output device:", None, |answer| {
        parse_index(answer, midi_devices.len())
    })?;
    if midi_devices[midi_device] == VIRTUAL_PORT_NAME {
        prompter.confirm(&format!(
            "Select \"{}\" as the MIDI input device in your DAW. Press Enter when ready.",
            VIRTUAL_PORT_NAME
        ))?;
    }
    let midi_channel = prompter.ask_with("MIDI output channel (1-16):", Some(1), |answer| {
        parse_ranged(answer, 1, 16)
    })?;

    prompter.say("\nAudio input devices:")?;
    for (index, device) in audio_devices.iter().enumerate() {
        prompter.say(format!("  {}: {}", index, device))?;
    }
    let audio_device = prompter.ask_with("Please select an audio input device:", None, |answer| {
        parse_index(answer, audio_devices.len())
    })?;
    let max_channels = audio_devices[audio_device].max_input_channels();
    let audio_channels = if max_channels > 2 {
        prompter.ask_with(
            "Specify two input channels, separated by a comma (e.g. 1,2):",
            None,
            |answer| {
                record::channel_mapping(max_channels, Some(parse_channel_pair(answer)?))
                    .map_err(|e| e.to_string())
            },
        )?
    } else {
        record::channel_mapping(max_channels, None)?
    };

    let start_key: MidiKey =
        prompter.ask_parsed("Enter start key (0-127 or a note name, middle C is 60 or C4):", None)?;
    let end_key = prompter.ask_with(
        "Enter end key (0-127 or a note name, middle C is 60 or C4):",
        None,
        |answer| {
            let end = answer.parse::<MidiKey>().map_err(|e| e.to_string())?;
            if end < start_key {
                return Err(format!("the end key must not be below {}", start_key));
            }
            Ok(end)
        },
    )?;
    let interval = prompter.ask_with(
        "How many semitones between samples (1 records every key):",
        Some(1),
        |answer| parse_ranged(answer, 1, 127).map(|value| value as u8),
    )?;
    let duration = prompter.ask_with(
        "How many seconds to record each note (e.g. 1.2):",
        None,
        |answer| {
            let duration = parse_seconds(answer)?;
            if duration.is_zero() {
                return Err("the duration must be longer than zero".to_string());
            }
            Ok(duration)
        },
    )?;

    let mut sample_rate = defaults.sample_rate();
    let mut velocity = defaults.velocity();
    let mut pre_roll = defaults.pre_roll()?;
    let mut sustain = duration.mul_f64(defaults.sustain_ratio()?);
    let mut loop_start = defaults.loop_start()?;
    let mut loop_end = defaults.loop_end()?;
    let mut loop_crossfade = defaults.loop_crossfade()?;

    let advanced = prompter.ask("Configure advanced settings? [y/N]")?;
    if advanced.eq_ignore_ascii_case("y") || advanced.eq_ignore_ascii_case("yes") {
        sample_rate = prompter.ask_with(
            &format!("Sample rate in Hz [{}]:", sample_rate),
            Some(sample_rate),
            |answer| parse_ranged(answer, 8000, 192000),
        )?;
        pre_roll = prompter.ask_with(
            &format!("Seconds to wait before each note [{}]:", pre_roll.as_secs_f64()),
            Some(pre_roll),
            parse_seconds,
        )?;
        sustain = prompter.ask_with(
            &format!("Seconds to hold each note [{}]:", sustain.as_secs_f64()),
            Some(sustain),
            parse_seconds,
        )?;
        velocity = prompter.ask_with(
            &format!("Note velocity (1-127) [{}]:", velocity),
            Some(velocity),
            |answer| parse_ranged(answer, 1, 127).map(|value| value as u8),
        )?;
        loop_start = prompter.ask_with(
            &format!("Loop start in seconds, or none [{}]:", describe(loop_start)),
            Some(loop_start),
            parse_optional_seconds,
        )?;
        loop_end = prompter.ask_with(
            &format!("Loop end in seconds, or none [{}]:", describe(loop_end)),
            Some(loop_end),
            parse_optional_seconds,
        )?;
        loop_crossfade = prompter.ask_with(
            &format!("Loop crossfade in seconds, or none [{}]:", describe(loop_crossfade)),
            Some(loop_crossfade),
            parse_optional_seconds,
        )?;
    }

    let preset_name = prompter.ask_with("Preset name:", None, |answer| {
        if crate::filename::sanitize_name(answer).trim().is_empty() {
            Err("the preset name must contain letters or numbers".to_string())
        } else {
            Ok(answer.to_string())
        }
    })?;
    let output = prompter.ask_with("Output directory [.]:", Some(PathBuf::from(".")), |answer| {
        Ok(PathBuf::from(answer))
    })?;
    prompter.confirm("Press Enter when you are ready to record.")?;

    Ok(Session {
        midi_device,
        audio_device,
        settings: RecordSettings {
            preset_name,
            output,
            midi_channel: u4::new(midi_channel as u8 - 1),
            audio_channels,
            start_key,
            end_key,
            interval,
            duration,
            sample_rate,
            velocity: u7::new(velocity),
            pre_roll,
            sustain,
            loop_start,
            loop_end,
            loop_crossfade,
            template,
        },
    })
}
