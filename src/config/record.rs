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
use std::time::Duration;

use duration_string::DurationString;
use serde::Deserialize;

use super::error::ConfigError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_VELOCITY: u8 = 112;
const DEFAULT_PRE_ROLL: Duration = Duration::ZERO;

/// Fraction of the record duration the note is held for.
pub const DEFAULT_SUSTAIN_RATIO: f64 = 0.33;

/// A YAML representation of the recording defaults.
#[derive(Deserialize, Clone, Default)]
pub struct RecordDefaults {
    /// The capture sample rate in Hz.
    sample_rate: Option<u32>,

    /// The note-on velocity.
    velocity: Option<u8>,

    /// How long to wait after arming the capture before sending the note.
    pre_roll: Option<String>,

    /// How long the note is held, as a fraction of the record duration.
    sustain_ratio: Option<f64>,

    /// Explicit loop points. When unset, loops default to 25%/75% of each sample.
    loop_start: Option<String>,
    loop_end: Option<String>,
    loop_crossfade: Option<String>,
}

fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    Ok(DurationString::from_string(value.to_string())
        .map_err(|e| ConfigError::Duration(value.to_string(), e.to_string()))?
        .into())
}

fn parse_optional(value: &Option<String>) -> Result<Option<Duration>, ConfigError> {
    value.as_deref().map(parse_duration).transpose()
}

impl RecordDefaults {
    /// Returns the capture sample rate (default: 44100).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    /// Returns the note-on velocity (default: 112).
    pub fn velocity(&self) -> u8 {
        self.velocity.unwrap_or(DEFAULT_VELOCITY).clamp(1, 127)
    }

    /// Returns the pre-roll delay (default: none).
    pub fn pre_roll(&self) -> Result<Duration, ConfigError> {
        Ok(parse_optional(&self.pre_roll)?.unwrap_or(DEFAULT_PRE_ROLL))
    }

    /// Returns the sustain ratio (default: 0.33).
    pub fn sustain_ratio(&self) -> Result<f64, ConfigError> {
        let ratio = self.sustain_ratio.unwrap_or(DEFAULT_SUSTAIN_RATIO);
        if ratio <= 0.0 || ratio > 1.0 {
            return Err(ConfigError::Invalid(
                "sustain_ratio",
                format!("{} is not within (0, 1]", ratio),
            ));
        }
        Ok(ratio)
    }

    pub fn loop_start(&self) -> Result<Option<Duration>, ConfigError> {
        parse_optional(&self.loop_start)
    }

    pub fn loop_end(&self) -> Result<Option<Duration>, ConfigError> {
        parse_optional(&self.loop_end)
    }

    pub fn loop_crossfade(&self) -> Result<Option<Duration>, ConfigError> {
        parse_optional(&self.loop_crossfade)
    }
}
