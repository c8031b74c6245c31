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
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{CaptureError, Recording};

/// Writes interleaved samples to a 32-bit float WAV file.
pub fn write_float(
    path: &Path,
    channels: u16,
    sample_rate: u32,
    samples: &[f32],
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(
        path,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()
}

impl Recording {
    /// Saves the recording as a 32-bit float WAV file.
    pub fn write(&self, path: &Path) -> Result<(), CaptureError> {
        write_float(path, self.channels, self.sample_rate, &self.samples).map_err(|source| {
            CaptureError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use hound::WavReader;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn recording_round_trips_through_hound() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("Strings-060.wav");
        let recording = Recording {
            sample_rate: 44100,
            channels: 2,
            samples: vec![0.25, -0.25, 0.5, -0.5, 0.75, -0.75],
        };
        recording.write(&path)?;

        let mut reader = WavReader::open(&path)?;
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(spec.sample_format, SampleFormat::Float);
        assert_eq!(reader.duration(), 3);
        let samples = reader.samples::<f32>().collect::<Result<Vec<f32>, _>>()?;
        assert_eq!(samples, recording.samples);
        Ok(())
    }
}
