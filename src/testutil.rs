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
use std::{error::Error, f32::consts::PI, fs::File, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Generates a sine wave at the given frequency.
pub fn sine(frequency: f32, sample_rate: u32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|i| 0.5 * (2.0 * PI * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

/// Writes planar 16-bit samples to a WAV file, interleaving the channels.
pub fn write_wav(path: &Path, samples: &[Vec<f32>], sample_rate: u32) -> Result<(), Box<dyn Error>> {
    let num_channels = samples.len();
    assert!(num_channels <= u16::MAX.into(), "Too many channels!");
    let frames = samples.iter().map(|channel| channel.len()).max().unwrap_or(0);

    let mut writer = WavWriter::new(
        File::create(path)?,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    )?;

    for frame in 0..frames {
        for channel in samples {
            let sample = channel.get(frame).copied().unwrap_or(0.0);
            writer.write_sample((sample * f32::from(i16::MAX)) as i16)?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// Writes a silent mono WAV file with the given number of frames.
pub fn write_silence(path: &Path, frames: usize, sample_rate: u32) -> Result<(), Box<dyn Error>> {
    write_wav(path, &[vec![0.0; frames]], sample_rate)
}
