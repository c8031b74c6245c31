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
//! Builds presets out of directories of existing samples.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tracing::{error, info, span, warn, Level};

use crate::audio::{AudioInfo, Decoder, Resampler, SincResampler, SymphoniaDecoder};
use crate::filename::{sanitize_name, SampleEntry};
use crate::keyrange::{self, AssignError, AssignInput};
use crate::preset::{self, PresetError, PresetTemplate};
use crate::util::{duration_frames, filename_display};

/// File extensions that are treated as samples.
const SAMPLE_EXTENSIONS: [&str; 3] = ["wav", "aif", "aiff"];

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("unable to read {}: {source}", .path.display())]
    ReadDirectory { path: PathBuf, source: io::Error },

    #[error("invalid sample start {0}, must be a non-negative number of seconds")]
    InvalidSampleStart(f64),

    #[error(transparent)]
    Assign(#[from] AssignError),

    #[error(transparent)]
    Preset(#[from] PresetError),
}

/// Knobs for a single pack.
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Overrides the preset name inferred from the samples.
    pub name: Option<String>,
    /// Re-encodes samples whose rate differs from this one.
    pub sample_rate: Option<u32>,
    /// Skips this many seconds at the start of every sample.
    pub sample_start: Option<f64>,
    /// The base preset template. The embedded one is used if not set.
    pub template: Option<PathBuf>,
}

/// A file that was left out of a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSample {
    pub path: PathBuf,
    pub reason: String,
}

/// The outcome of packing one preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackReport {
    pub preset_name: String,
    pub preset_directory: PathBuf,
    pub regions: usize,
    pub skipped: Vec<SkippedSample>,
}

/// The outcome of packing one directory in bulk mode.
#[derive(Debug)]
pub struct BulkResult {
    pub input: PathBuf,
    pub result: Result<PackReport, PackError>,
}

/// Packs sample directories into presets.
pub struct Packer {
    decoder: Arc<dyn Decoder>,
    resampler: Arc<dyn Resampler>,
}

impl Default for Packer {
    fn default() -> Packer {
        Packer::new(Arc::new(SymphoniaDecoder), Arc::new(SincResampler))
    }
}

impl Packer {
    pub fn new(decoder: Arc<dyn Decoder>, resampler: Arc<dyn Resampler>) -> Packer {
        Packer { decoder, resampler }
    }

    /// Packs every sample in the input directory into a single preset under the
    /// output directory.
    pub fn pack(
        &self,
        input: &Path,
        output: &Path,
        options: &PackOptions,
    ) -> Result<PackReport, PackError> {
        let span = span!(Level::INFO, "pack");
        let _enter = span.enter();

        if let Some(start) = options.sample_start {
            if !start.is_finite() || start < 0.0 {
                return Err(PackError::InvalidSampleStart(start));
            }
        }

        let mut skipped: Vec<SkippedSample> = Vec::new();
        let mut entries: Vec<SampleEntry> = Vec::new();
        for path in sample_files(input)? {
            match SampleEntry::from_path(&path) {
                Ok(entry) => entries.push(entry),
                Err(e) => skip(&mut skipped, path, e.to_string()),
            }
        }
        if entries.is_empty() {
            return Err(AssignError::EmptyInput.into());
        }

        let preset_name = preset_name(input, options.name.as_deref(), &entries);
        // The highest velocity per key is kept, falling back to the file that
        // sorts last.
        let retained = keyrange::dedupe(
            entries
                .into_iter()
                .map(|entry| AssignInput::new(entry, 0))
                .collect(),
        );

        let template = PresetTemplate::load(options.template.as_deref())?;
        let preset_directory = preset::create_preset_directory(output, &preset_name)?;
        info!(
            preset = preset_name,
            directory = preset_directory.display().to_string(),
            samples = retained.len(),
            "Packing preset."
        );

        let mut inputs: Vec<AssignInput> = Vec::with_capacity(retained.len());
        for (_, input) in retained {
            let source = input.entry.source_path.clone();
            match self.place_sample(input, &preset_directory, options) {
                Ok(input) => inputs.push(input),
                Err(reason) => skip(&mut skipped, source, reason),
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
        Ok(PackReport {
            preset_name,
            preset_directory,
            regions: ranges.len(),
            skipped,
        })
    }

    /// Packs each immediate sub-directory of the bulk directory as its own
    /// preset. A failing preset does not stop the others.
    pub fn pack_bulk(
        &self,
        bulk: &Path,
        output: &Path,
        options: &PackOptions,
    ) -> Result<Vec<BulkResult>, PackError> {
        let mut directories: Vec<PathBuf> = read_directory(bulk)?
            .into_iter()
            .filter(|path| path.is_dir())
            .collect();
        directories.sort();

        if options.name.is_some() {
            warn!("Preset names are inferred per directory in bulk mode, ignoring the given name.");
        }
        let options = PackOptions {
            name: None,
            ..options.clone()
        };

        Ok(directories
            .into_iter()
            .map(|input| {
                let result = self.pack(&input, output, &options);
                if let Err(e) = &result {
                    error!(
                        directory = input.display().to_string(),
                        err = e.to_string(),
                        "Unable to pack directory."
                    );
                }
                BulkResult { input, result }
            })
            .collect())
    }

    /// Copies or re-encodes one sample into the preset directory and fills in
    /// its playback metadata. Errors are returned as user-facing reasons.
    fn place_sample(
        &self,
        mut input: AssignInput,
        preset_directory: &Path,
        options: &PackOptions,
    ) -> Result<AssignInput, String> {
        let source = input.entry.source_path.clone();
        let mut info = self.decoder.probe(&source).map_err(|e| e.to_string())?;

        match options.sample_rate {
            Some(sample_rate) if sample_rate != info.sample_rate => {
                let filename = Path::new(&input.entry.sanitized_filename)
                    .with_extension("wav")
                    .to_string_lossy()
                    .to_string();
                let destination = preset_directory.join(&filename);
                info = self.resample(&source, &destination, sample_rate)?;
                input.entry.sanitized_filename = filename;
            }
            _ => {
                let destination = preset_directory.join(&input.entry.sanitized_filename);
                fs::copy(&source, &destination).map_err(|e| {
                    format!("unable to copy to {}: {}", destination.display(), e)
                })?;
            }
        }

        input.frame_count = info.frame_count;
        input.sample_start = options
            .sample_start
            .map(|seconds| seconds_to_frames(seconds, info));
        Ok(input)
    }

    /// Re-encodes a sample into the preset directory and probes the result. A
    /// failed or unreadable output is removed.
    fn resample(
        &self,
        source: &Path,
        destination: &Path,
        sample_rate: u32,
    ) -> Result<AudioInfo, String> {
        let result = self
            .resampler
            .resample(source, destination, sample_rate)
            .map_err(|e| e.to_string())
            .and_then(|_| self.decoder.probe(destination).map_err(|e| e.to_string()));

        if result.is_err() {
            if let Err(e) = fs::remove_file(destination) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(
                        file = filename_display(destination),
                        err = e.to_string(),
                        "Unable to remove partial sample."
                    );
                }
            }
        }
        result
    }
}

fn skip(skipped: &mut Vec<SkippedSample>, path: PathBuf, reason: String) {
    error!(
        file = filename_display(&path),
        err = reason,
        "Skipping sample."
    );
    skipped.push(SkippedSample { path, reason });
}

fn seconds_to_frames(seconds: f64, info: AudioInfo) -> u64 {
    Duration::try_from_secs_f64(seconds)
        .map(|duration| duration_frames(duration, info.sample_rate))
        .unwrap_or(info.frame_count)
        .min(info.frame_count)
}

/// Picks the preset name: the explicit one if present, else the first sample's
/// base name, else the input directory's name.
fn preset_name(input: &Path, explicit: Option<&str>, entries: &[SampleEntry]) -> String {
    let directory_name = input
        .file_name()
        .map(|name| sanitize_name(&name.to_string_lossy()))
        .unwrap_or_default();
    [
        explicit.map(sanitize_name).unwrap_or_default(),
        entries
            .first()
            .map(|entry| entry.base_name.trim().to_string())
            .unwrap_or_default(),
        directory_name,
    ]
    .into_iter()
    .find(|name| !name.trim().is_empty())
    .unwrap_or_else(|| "Preset".to_string())
}

fn read_directory(path: &Path) -> Result<Vec<PathBuf>, PackError> {
    let read_error = |source| PackError::ReadDirectory {
        path: path.to_path_buf(),
        source,
    };
    fs::read_dir(path)
        .map_err(read_error)?
        .map(|entry| entry.map(|entry| entry.path()).map_err(read_error))
        .collect()
}

/// Lists the sample files in a directory, sorted by name.
fn sample_files(directory: &Path) -> Result<Vec<PathBuf>, PackError> {
    let mut files: Vec<PathBuf> = read_directory(directory)?
        .into_iter()
        .filter(|path| path.is_file() && is_sample(path))
        .collect();
    files.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));
    Ok(files)
}

fn is_sample(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| SAMPLE_EXTENSIONS.contains(&ext.as_str()))
}
