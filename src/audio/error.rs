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
use std::{io, path::PathBuf};

/// Errors raised while reading an audio file.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unable to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("unable to decode {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        source: symphonia::core::errors::Error,
    },

    #[error("{} has no audio track", .0.display())]
    NoAudioTrack(PathBuf),

    #[error("{} does not declare a sample rate", .0.display())]
    MissingSampleRate(PathBuf),
}

/// Errors raised while re-encoding an audio file at a new sample rate.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unable to resample {0}Hz -> {1}Hz: {2}")]
    Construction(u32, u32, rubato::ResamplerConstructionError),

    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),

    #[error("unable to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: hound::Error },
}

/// Errors raised while capturing audio from an input device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("device {device} cannot capture {channels} channels at {sample_rate}Hz")]
    UnsupportedConfig {
        device: String,
        channels: u16,
        sample_rate: u32,
    },

    #[error("unsupported sample format {0}")]
    UnsupportedFormat(String),

    #[error("input channel {channel} is out of range (device has {available})")]
    InvalidChannel { channel: u16, available: u16 },

    #[error("audio stream error: {0}")]
    Stream(String),

    #[error("timed out after capturing {captured} of {requested} frames")]
    Timeout { captured: usize, requested: usize },

    #[error("unable to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: hound::Error },
}
