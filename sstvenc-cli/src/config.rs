use std::path::{
    Path,
    PathBuf,
};

use color_eyre::eyre::eyre;
use directories::ProjectDirs;
use serde::{
    Deserialize,
    Serialize,
};
use sstvenc::sink::AudioFormat;

use crate::Error;

/// Settings read from `config.toml`. Command line flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub mode: Option<String>,
    pub sample_rate: Option<f32>,
    pub enhance: Option<bool>,
    pub watermark_text: Option<String>,
    pub watermark_image: Option<PathBuf>,
    pub formats: Option<Vec<String>>,
    pub transcoder: Option<String>,
    pub bitrate: Option<String>,
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading config from file");
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    pub fn from_toml(toml: &str) -> Result<Self, Error> {
        Ok(toml::from_str(toml)?)
    }

    /// Loads `path` if given, otherwise the default config file if it
    /// exists.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = path {
            return Self::from_path(path);
        }

        match default_path() {
            Some(path) if path.exists() => Self::from_path(path),
            _ => Ok(Self::default()),
        }
    }

    pub fn formats(&self) -> Result<Option<Vec<AudioFormat>>, Error> {
        self.formats
            .as_ref()
            .map(|formats| {
                formats
                    .iter()
                    .map(|format| format.parse::<AudioFormat>().map_err(|error| eyre!(error)))
                    .collect()
            })
            .transpose()
    }
}

pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "sstvenc", "sstvenc-cli")
        .map(|project_dirs| project_dirs.config_dir().join("config.toml"))
}
