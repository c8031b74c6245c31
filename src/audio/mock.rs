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
use std::{
    collections::{HashMap, HashSet},
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use tracing::{info, span, Level};

use super::{
    AudioInfo, Capture, CaptureError, CaptureRequest, DecodeError, Recording, ResampleError,
};

/// A mock input device. Produces a constant signal instead of recording.
#[derive(Clone)]
pub struct Device {
    name: String,
    max_channels: u16,
    requests: Arc<Mutex<Vec<CaptureRequest>>>,
    failing_captures: HashSet<usize>,
}

impl Device {
    pub fn get(name: &str, max_channels: u16) -> Device {
        Device {
            name: name.to_string(),
            max_channels,
            requests: Arc::new(Mutex::new(Vec::new())),
            failing_captures: HashSet::new(),
        }
    }

    /// Makes the capture with the given zero-based index fail.
    pub fn fail_capture(mut self, index: usize) -> Device {
        self.failing_captures.insert(index);
        self
    }

    /// Every capture requested so far.
    pub fn requests(&self) -> Vec<CaptureRequest> {
        self.requests.lock().expect("unable to get requests lock").clone()
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn max_input_channels(&self) -> u16 {
        self.max_channels
    }

    fn start_capture(&self, request: &CaptureRequest) -> Result<Box<dyn Capture>, CaptureError> {
        let span = span!(Level::INFO, "start capture (mock)");
        let _enter = span.enter();

        let index = {
            let mut requests = self.requests.lock().expect("unable to get requests lock");
            requests.push(request.clone());
            requests.len() - 1
        };
        info!(device = self.name, index, "Capturing audio.");

        if self.failing_captures.contains(&index) {
            return Err(CaptureError::Stream("mock capture failure".to_string()));
        }
        Ok(Box::new(MockCapture {
            request: request.clone(),
        }))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Channels={}) (Mock)", self.name, self.max_channels)
    }
}

struct MockCapture {
    request: CaptureRequest,
}

impl Capture for MockCapture {
    fn finish(self: Box<Self>) -> Result<Recording, CaptureError> {
        let channels = self.request.channels.len() as u16;
        Ok(Recording {
            sample_rate: self.request.sample_rate,
            channels,
            samples: vec![0.25; self.request.frames * usize::from(channels)],
        })
    }
}

/// A decoder that answers from a table keyed by file name.
#[derive(Default)]
pub struct Decoder {
    files: HashMap<String, AudioInfo>,
}

impl Decoder {
    pub fn with(mut self, filename: &str, sample_rate: u32, frame_count: u64) -> Decoder {
        self.files.insert(
            filename.to_string(),
            AudioInfo {
                sample_rate,
                frame_count,
            },
        );
        self
    }
}

impl super::Decoder for Decoder {
    fn probe(&self, path: &Path) -> Result<AudioInfo, DecodeError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        self.files
            .get(&filename)
            .copied()
            .ok_or_else(|| DecodeError::NoAudioTrack(path.to_path_buf()))
    }
}

/// A resampler that copies files untouched and remembers what it was asked.
#[derive(Default)]
pub struct Resampler {
    calls: Mutex<Vec<(PathBuf, PathBuf, u32)>>,
}

impl Resampler {
    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, u32)> {
        self.calls.lock().expect("unable to get calls lock").clone()
    }
}

impl super::Resampler for Resampler {
    fn resample(&self, input: &Path, output: &Path, sample_rate: u32) -> Result<(), ResampleError> {
        self.calls.lock().expect("unable to get calls lock").push((
            input.to_path_buf(),
            output.to_path_buf(),
            sample_rate,
        ));
        fs::copy(input, output).map_err(|source| {
            ResampleError::Decode(DecodeError::Open {
                path: input.to_path_buf(),
                source,
            })
        })?;
        Ok(())
    }
}
