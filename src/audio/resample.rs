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

use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};
use tracing::{info, span, Level};

use super::{decode_file, wav, ResampleError};

/// Number of input frames fed to the resampler at a time.
const CHUNK_FRAMES: usize = 1024;

/// Re-encodes audio files with a sinc resampler, writing 32-bit float WAV.
#[derive(Debug, Clone, Copy, Default)]
pub struct SincResampler;

impl super::Resampler for SincResampler {
    fn resample(&self, input: &Path, output: &Path, sample_rate: u32) -> Result<(), ResampleError> {
        let span = span!(Level::INFO, "resample (rubato)");
        let _enter = span.enter();

        let decoded = decode_file(input)?;
        info!(
            file = input.display().to_string(),
            from = decoded.sample_rate,
            to = sample_rate,
            "Resampling."
        );

        let planes = if decoded.sample_rate == sample_rate {
            decoded.planar()
        } else {
            resample_planes(decoded.planar(), decoded.sample_rate, sample_rate)?
        };

        let frames = planes.first().map(Vec::len).unwrap_or(0);
        let mut interleaved = Vec::with_capacity(frames * planes.len());
        for frame in 0..frames {
            for plane in &planes {
                interleaved.push(plane[frame]);
            }
        }

        wav::write_float(output, planes.len() as u16, sample_rate, &interleaved).map_err(
            |source| ResampleError::Write {
                path: output.to_path_buf(),
                source,
            },
        )
    }
}

/// Resamples planar audio, compensating for the resampler's delay so the
/// output lines up with the input.
fn resample_planes(
    planes: Vec<Vec<f32>>,
    from: u32,
    to: u32,
) -> Result<Vec<Vec<f32>>, ResampleError> {
    let channels = planes.len();
    let frames = planes.first().map(Vec::len).unwrap_or(0);
    if channels == 0 || frames == 0 {
        return Ok(planes.into_iter().map(|_| Vec::new()).collect());
    }

    let ratio = f64::from(to) / f64::from(from);
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)
        .map_err(|e| ResampleError::Construction(from, to, e))?;

    let delay = resampler.output_delay();
    let expected = (frames as f64 * ratio).round() as usize;
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];

    let mut position = 0;
    while position < frames {
        let needed = resampler.input_frames_next();
        let end = (position + needed).min(frames);
        let chunk: Vec<&[f32]> = planes.iter().map(|plane| &plane[position..end]).collect();
        let resampled = if end - position == needed {
            resampler.process(chunk.as_slice(), None)?
        } else {
            resampler.process_partial(Some(chunk.as_slice()), None)?
        };
        append(&mut output, resampled);
        position = end;
    }

    // Flush the tail out of the resampler.
    while output[0].len() < delay + expected {
        let resampled = resampler.process_partial(None::<&[Vec<f32>]>, None)?;
        if resampled.first().map(Vec::is_empty).unwrap_or(true) {
            break;
        }
        append(&mut output, resampled);
    }

    Ok(output
        .into_iter()
        .map(|plane| {
            let start = delay.min(plane.len());
            let end = (delay + expected).min(plane.len());
            plane[start..end].to_vec()
        })
        .collect())
}

fn append(output: &mut [Vec<f32>], resampled: Vec<Vec<f32>>) {
    for (plane, chunk) in output.iter_mut().zip(resampled) {
        plane.extend(chunk);
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use tempfile::tempdir;

    use super::*;
    use crate::audio::{probe_file, Resampler};
    use crate::testutil::{sine, write_wav};

    #[test]
    fn resample_to_lower_rate() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let input = dir.path().join("Pad-60.wav");
        let output = dir.path().join("Pad-60-out.wav");
        write_wav(&input, &[sine(220.0, 48000, 4800), sine(330.0, 48000, 4800)], 48000)?;

        SincResampler.resample(&input, &output, 24000)?;

        let info = probe_file(&output)?;
        assert_eq!(info.sample_rate, 24000);
        assert_eq!(info.frame_count, 2400);
        Ok(())
    }

    #[test]
    fn resample_to_higher_rate() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let input = dir.path().join("Bass-36.wav");
        let output = dir.path().join("Bass-36-out.wav");
        write_wav(&input, &[sine(110.0, 22050, 2205)], 22050)?;

        SincResampler.resample(&input, &output, 44100)?;

        let decoded = decode_file(&output)?;
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.frame_count(), 4410);
        // The signal survives resampling.
        let peak = decoded.samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
        assert!(peak > 0.3, "peak was {}", peak);
        Ok(())
    }
}
