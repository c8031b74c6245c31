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
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::keyrange::KeyRange;
use crate::notes::MidiKey;

/// The manifest file name inside a preset directory.
pub const MANIFEST_FILE: &str = "patch.json";

/// The extension of a preset directory.
pub const PRESET_EXTENSION: &str = "preset";

/// The base template shipped with the tool.
const EMBEDDED_TEMPLATE: &str = include_str!("../assets/preset.json");

const REGIONS_KEY: &str = "regions";

#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("unable to create preset directory {}: {source}", .path.display())]
    DirectoryCreation { path: PathBuf, source: io::Error },

    #[error("invalid preset template: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The global part of a preset, which every region list is merged into.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetTemplate {
    fields: Map<String, Value>,
}

impl PresetTemplate {
    /// The template embedded in the binary.
    pub fn embedded() -> Result<PresetTemplate, PresetError> {
        PresetTemplate::parse(EMBEDDED_TEMPLATE)
    }

    /// Reads a template from a JSON file.
    pub fn from_file(path: &Path) -> Result<PresetTemplate, PresetError> {
        PresetTemplate::parse(&fs::read_to_string(path)?)
    }

    /// Loads the template from the given file, or the embedded one if there is none.
    pub fn load(path: Option<&Path>) -> Result<PresetTemplate, PresetError> {
        match path {
            Some(path) => PresetTemplate::from_file(path),
            None => PresetTemplate::embedded(),
        }
    }

    /// Parses a template from JSON text. The top level must be an object, and a
    /// `regions` entry, if present, must be an array.
    pub fn parse(json: &str) -> Result<PresetTemplate, PresetError> {
        let fields = match serde_json::from_str::<Value>(json)? {
            Value::Object(fields) => fields,
            _ => return Err(PresetError::Template("top level must be an object".into())),
        };
        if fields
            .get(REGIONS_KEY)
            .is_some_and(|regions| !regions.is_array())
        {
            return Err(PresetError::Template(format!(
                "'{}' must be an array",
                REGIONS_KEY
            )));
        }
        Ok(PresetTemplate { fields })
    }
}

/// A single playback region as stored in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    #[serde(rename = "framecount")]
    pub frame_count: u64,
    #[serde(rename = "hikey")]
    pub hi_key: MidiKey,
    #[serde(rename = "lokey")]
    pub low_key: MidiKey,
    #[serde(rename = "loop.crossfade")]
    pub loop_crossfade: u64,
    #[serde(rename = "loop.end")]
    pub loop_end: u64,
    #[serde(rename = "loop.onrelease")]
    pub loop_on_release: bool,
    #[serde(rename = "loop.start")]
    pub loop_start: u64,
    #[serde(rename = "pitch.keycenter")]
    pub key_center: MidiKey,
    pub reverse: bool,
    pub sample: String,
    #[serde(rename = "sample.end")]
    pub sample_end: u64,
    #[serde(rename = "sample.start", skip_serializing_if = "Option::is_none")]
    pub sample_start: Option<u64>,
    pub tune: i32,
}

impl From<&KeyRange> for Region {
    fn from(range: &KeyRange) -> Region {
        Region {
            frame_count: range.frame_count,
            hi_key: range.hi_key,
            low_key: range.low_key,
            loop_crossfade: range.loop_crossfade,
            loop_end: range.loop_end,
            loop_on_release: true,
            loop_start: range.loop_start,
            key_center: range.center_key,
            reverse: false,
            sample: range.sample.sanitized_filename.clone(),
            sample_end: range.frame_count,
            sample_start: range.sample_start,
            tune: 0,
        }
    }
}

/// A complete preset manifest. Built once and written once.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetManifest {
    fields: Map<String, Value>,
}

impl PresetManifest {
    /// The region list of the manifest.
    pub fn regions(&self) -> &[Value] {
        self.fields
            .get(REGIONS_KEY)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Gets a global (non-region) field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Serializes the manifest.
    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string(&self.fields)?)
    }

    /// Writes the manifest into the given preset directory and returns its path.
    pub fn write(&self, preset_directory: &Path) -> Result<PathBuf, PresetError> {
        let path = preset_directory.join(MANIFEST_FILE);
        fs::write(&path, self.to_json()?)?;
        debug!(path = path.display().to_string(), "Wrote preset manifest.");
        Ok(path)
    }
}

/// Merges the ranges into a copy of the template, one region per range, in
/// range order. The template itself is left untouched.
pub fn assemble(
    template: &PresetTemplate,
    ranges: &[KeyRange],
) -> Result<PresetManifest, PresetError> {
    let mut fields = template.fields.clone();
    let mut regions = match fields.remove(REGIONS_KEY) {
        Some(Value::Array(regions)) => regions,
        _ => Vec::new(),
    };
    for range in ranges {
        regions.push(serde_json::to_value(Region::from(range))?);
    }
    fields.insert(REGIONS_KEY.to_string(), Value::Array(regions));

    Ok(PresetManifest { fields })
}

/// The directory a preset with the given name is written to.
pub fn preset_directory(output_directory: &Path, preset_name: &str) -> PathBuf {
    output_directory.join(format!("{}.{}", preset_name, PRESET_EXTENSION))
}

/// Creates the preset directory, including any missing parents.
pub fn create_preset_directory(
    output_directory: &Path,
    preset_name: &str,
) -> Result<PathBuf, PresetError> {
    let directory = preset_directory(output_directory, preset_name);
    fs::create_dir_all(&directory).map_err(|source| PresetError::DirectoryCreation {
        path: directory.clone(),
        source,
    })?;
    Ok(directory)
}

#[cfg(test)]
mod test {
    use std::{error::Error, path::PathBuf};

    use serde_json::json;

    use super::*;
    use crate::filename::SampleEntry;
    use crate::keyrange::{assign, AssignInput};

    fn ranges() -> Result<Vec<KeyRange>, Box<dyn Error>> {
        let inputs = [(40, "Bass-40.wav"), (60, "Bass-60.wav")]
            .into_iter()
            .map(|(key, name)| {
                AssignInput::new(
                    SampleEntry {
                        base_name: "Bass".to_string(),
                        key: MidiKey::new(key).expect("valid key"),
                        source_path: PathBuf::from(name),
                        sanitized_filename: name.to_string(),
                        velocity: None,
                    },
                    4000,
                )
            })
            .collect();
        Ok(assign(inputs)?)
    }

    #[test]
    fn region_fields() -> Result<(), Box<dyn Error>> {
        let template = PresetTemplate::parse(r#"{"type": "multisampler", "regions": []}"#)?;
        let manifest = assemble(&template, &ranges()?)?;

        assert_eq!(manifest.get("type"), Some(&json!("multisampler")));
        assert_eq!(
            manifest.regions(),
            &[
                json!({
                    "framecount": 4000,
                    "hikey": 40,
                    "lokey": 0,
                    "loop.crossfade": 0,
                    "loop.end": 3000,
                    "loop.onrelease": true,
                    "loop.start": 1000,
                    "pitch.keycenter": 40,
                    "reverse": false,
                    "sample": "Bass-40.wav",
                    "sample.end": 4000,
                    "tune": 0
                }),
                json!({
                    "framecount": 4000,
                    "hikey": 127,
                    "lokey": 41,
                    "loop.crossfade": 0,
                    "loop.end": 3000,
                    "loop.onrelease": true,
                    "loop.start": 1000,
                    "pitch.keycenter": 60,
                    "reverse": false,
                    "sample": "Bass-60.wav",
                    "sample.end": 4000,
                    "tune": 0
                }),
            ]
        );
        Ok(())
    }

    #[test]
    fn sample_start_is_emitted_when_trimmed() -> Result<(), Box<dyn Error>> {
        let mut ranges = ranges()?;
        ranges[0].sample_start = Some(2205);
        let manifest = assemble(&PresetTemplate::embedded()?, &ranges)?;
        assert_eq!(manifest.regions()[0]["sample.start"], json!(2205));
        assert!(manifest.regions()[1].get("sample.start").is_none());
        Ok(())
    }

    #[test]
    fn assemble_is_idempotent() -> Result<(), Box<dyn Error>> {
        let template = PresetTemplate::embedded()?;
        let ranges = ranges()?;
        let first = assemble(&template, &ranges)?.to_json()?;
        let second = assemble(&template, &ranges)?.to_json()?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn template_is_not_mutated() -> Result<(), Box<dyn Error>> {
        let template = PresetTemplate::embedded()?;
        let before = template.clone();
        let manifest = assemble(&template, &ranges()?)?;
        assert_eq!(template, before);
        assert_eq!(manifest.regions().len(), 2);

        // A second preset built from the same template doesn't see the first's regions.
        let other = assemble(&template, &ranges()?[..1])?;
        assert_eq!(other.regions().len(), 1);
        Ok(())
    }

    #[test]
    fn template_regions_are_extended() -> Result<(), Box<dyn Error>> {
        let template = PresetTemplate::parse(r#"{"regions": [{"sample": "existing.wav"}]}"#)?;
        let manifest = assemble(&template, &ranges()?)?;
        assert_eq!(manifest.regions().len(), 3);
        assert_eq!(manifest.regions()[0]["sample"], json!("existing.wav"));
        assert_eq!(manifest.regions()[1]["sample"], json!("Bass-40.wav"));
        Ok(())
    }

    #[test]
    fn invalid_templates() {
        assert!(matches!(
            PresetTemplate::parse("[]"),
            Err(PresetError::Template(_))
        ));
        assert!(matches!(
            PresetTemplate::parse(r#"{"regions": 5}"#),
            Err(PresetError::Template(_))
        ));
        assert!(matches!(
            PresetTemplate::parse("{"),
            Err(PresetError::Json(_))
        ));
    }

    #[test]
    fn embedded_template() -> Result<(), Box<dyn Error>> {
        let template = PresetTemplate::load(None)?;
        let manifest = assemble(&template, &[])?;
        assert_eq!(manifest.get("platform"), Some(&json!("OP-XY")));
        assert!(manifest.regions().is_empty());
        Ok(())
    }

    #[test]
    fn write_manifest() -> Result<(), Box<dyn Error>> {
        let output = tempfile::tempdir()?;
        let directory = create_preset_directory(output.path(), "My Bass")?;
        assert_eq!(directory, output.path().join("My Bass.preset"));
        assert!(directory.is_dir());

        let manifest = assemble(&PresetTemplate::embedded()?, &ranges()?)?;
        let path = manifest.write(&directory)?;
        assert_eq!(path, directory.join(MANIFEST_FILE));
        assert_eq!(fs::read_to_string(path)?, manifest.to_json()?);
        Ok(())
    }

    #[test]
    fn directory_creation_failure() -> Result<(), Box<dyn Error>> {
        let output = tempfile::tempdir()?;
        let blocker = output.path().join("file");
        fs::write(&blocker, "not a directory")?;
        assert!(matches!(
            create_preset_directory(&blocker, "Preset"),
            Err(PresetError::DirectoryCreation { .. })
        ));
        Ok(())
    }
}
