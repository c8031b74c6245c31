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
use std::{fmt, path::Path, sync::Arc};

use crate::device::{self, DeviceError};

pub mod cpal;
mod decode;
mod error;
#[cfg(test)]
pub mod mock;
mod resample;
pub mod wav;

pub use decode::{decode_file, probe_file, DecodedAudio, SymphoniaDecoder};
pub use error::{CaptureError, DecodeError, ResampleError};
pub use resample::SincResampler;

/// The properties of an audio file that matter to a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub frame_count: u64,
}

/// Reads the sample rate and length of audio files.
pub trait Decoder {
    fn probe(&self, path: &Path) -> Result<AudioInfo, DecodeError>;
}

/// Re-encodes audio files at a new sample rate.
pub trait Resampler {
    /// Writes `input` to `output` as a WAV file at the given sample rate.
    fn resample(&self, input: &Path, output: &Path, sample_rate: u32) -> Result<(), ResampleError>;
}

/// What to capture from an input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub sample_rate: u32,
    /// Device input channels to capture, numbered from 1. Their order is the
    /// channel order of the recording.
    pub channels: Vec<u16>,
    /// How many frames to capture.
    pub frames: usize,
}

/// Audio captured from an input device, interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl Recording {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / usize::from(self.channels)
        }
    }
}

/// A capture in progress.
pub trait Capture {
    /// Blocks until the requested number of frames has been captured, then
    /// stops the stream.
    fn finish(self: Box<Self>) -> Result<Recording, CaptureError>;
}

/// An audio input device.
pub trait Device: fmt::Display + Send + Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// The number of input channels the device offers.
    fn max_input_channels(&self) -> u16;

    /// Starts capturing audio. Capture begins immediately.
    fn start_capture(&self, request: &CaptureRequest) -> Result<Box<dyn Capture>, CaptureError>;
}

/// Lists input devices known to cpal.
pub fn list_devices() -> Result<Vec<Box<dyn Device>>, DeviceError> {
    cpal::Device::list()
}

/// Gets the input device at the given index of the listing.
pub fn get_device(index: usize) -> Result<Arc<dyn Device>, DeviceError> {
    let device = device::select("audio input", cpal::Device::list_cpal_devices()?, index)?;
    Ok(Arc::new(device))
}
