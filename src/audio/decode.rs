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
use std::{fs::File, io, path::Path};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::{debug, warn};

use super::{AudioInfo, DecodeError};

/// A fully decoded audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: usize,
    /// Interleaved samples.
    pub samples: Vec<f32>,
}

impl DecodedAudio {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Splits the interleaved samples into one buffer per channel.
    pub fn planar(&self) -> Vec<Vec<f32>> {
        let mut planes = vec![Vec::with_capacity(self.frame_count()); self.channels];
        for frame in self.samples.chunks_exact(self.channels.max(1)) {
            for (plane, sample) in planes.iter_mut().zip(frame) {
                plane.push(*sample);
            }
        }
        planes
    }
}

/// Probes audio files with symphonia.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl super::Decoder for SymphoniaDecoder {
    fn probe(&self, path: &Path) -> Result<AudioInfo, DecodeError> {
        probe_file(path)
    }
}

struct OpenTrack {
    format: Box<dyn FormatReader>,
    track_id: u32,
    params: CodecParameters,
    sample_rate: u32,
}

fn format_error(path: &Path, source: SymphoniaError) -> DecodeError {
    DecodeError::Format {
        path: path.to_path_buf(),
        source,
    }
}

fn open(path: &Path) -> Result<OpenTrack, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format_error(path, e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack(path.to_path_buf()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();
    let sample_rate = params
        .sample_rate
        .ok_or_else(|| DecodeError::MissingSampleRate(path.to_path_buf()))?;

    Ok(OpenTrack {
        format: probed.format,
        track_id,
        params,
        sample_rate,
    })
}

/// Reads the sample rate and frame count of an audio file. Containers that
/// don't declare their length are decoded in full to count the frames.
pub fn probe_file(path: &Path) -> Result<AudioInfo, DecodeError> {
    let track = open(path)?;
    if let Some(frame_count) = track.params.n_frames {
        return Ok(AudioInfo {
            sample_rate: track.sample_rate,
            frame_count,
        });
    }

    debug!(
        file = path.display().to_string(),
        "Container has no frame count, decoding to count frames."
    );
    let decoded = decode_track(path, track)?;
    Ok(AudioInfo {
        sample_rate: decoded.sample_rate,
        frame_count: decoded.frame_count() as u64,
    })
}

/// Decodes an entire audio file to interleaved f32 samples.
pub fn decode_file(path: &Path) -> Result<DecodedAudio, DecodeError> {
    let track = open(path)?;
    decode_track(path, track)
}

fn decode_track(path: &Path, track: OpenTrack) -> Result<DecodedAudio, DecodeError> {
    let OpenTrack {
        mut format,
        track_id,
        params,
        sample_rate,
    } = track;

    let mut decoder = get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| format_error(path, e))?;

    let mut channels = params.channels.map(|c| c.count()).unwrap_or(0);
    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(format_error(path, e)),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                if channels == 0 {
                    channels = decoded.spec().channels.count();
                }
                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // Corrupt packets are skipped rather than failing the whole file.
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(
                    file = path.display().to_string(),
                    err = e,
                    "Skipping undecodable packet."
                );
            }
            Err(e) => return Err(format_error(path, e)),
        }
    }

    Ok(DecodedAudio {
        sample_rate,
        channels,
        samples,
    })
}
