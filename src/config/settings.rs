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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use super::error::ConfigError;
use super::record::RecordDefaults;

/// A YAML representation of the tool settings.
#[derive(Deserialize, Clone, Default)]
pub struct Settings {
    /// A JSON preset template to use instead of the built-in one.
    template: Option<String>,

    /// Defaults for recording sessions.
    #[serde(default)]
    record: RecordDefaults,

    /// The directory the settings file was loaded from. Relative paths are
    /// resolved against it.
    #[serde(skip)]
    base_path: Option<PathBuf>,
}

impl Settings {
    /// Parses settings from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Settings, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.base_path = path.parent().map(Path::to_path_buf);
        Ok(settings)
    }

    /// Loads settings from the given file, or the defaults if there is none.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            Some(path) => Settings::deserialize(path),
            None => Ok(Settings::default()),
        }
    }

    /// The preset template path, if one is configured.
    pub fn template(&self) -> Option<PathBuf> {
        self.template.as_ref().map(|template| {
            let template = PathBuf::from(template);
            match &self.base_path {
                Some(base_path) if template.is_relative() => base_path.join(template),
                _ => template,
            }
        })
    }

    /// The recording defaults.
    pub fn record(&self) -> &RecordDefaults {
        &self.record
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, fs, path::PathBuf};

    use super::Settings;

    #[test]
    fn empty_settings() {
        let settings = Settings::default();
        assert!(settings.template().is_none());
        assert_eq!(settings.record().velocity(), 112);
    }

    #[test]
    fn template_relative_to_settings_file() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            r#"
            template: templates/keys.json
            record:
              velocity: 90
            "#,
        )?;

        let settings = Settings::load(Some(&path))?;
        assert_eq!(
            settings.template(),
            Some(dir.path().join("templates/keys.json"))
        );
        assert_eq!(settings.record().velocity(), 90);
        Ok(())
    }

    #[test]
    fn absolute_template() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "template: /presets/base.json\n")?;

        let settings = Settings::load(Some(&path))?;
        assert_eq!(settings.template(), Some(PathBuf::from("/presets/base.json")));
        Ok(())
    }

    #[test]
    fn missing_file() {
        let path = PathBuf::from("/definitely/not/here/settings.yaml");
        assert!(Settings::load(Some(&path)).is_err());
    }
}
