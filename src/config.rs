use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;

/// How many cleaned items are remembered in [`Config::history`].
pub const HISTORY_LEN: usize = 5;

/// Switches for a single clean operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleaningOptions {
    /// Resolve short links before cleaning them.
    pub unshorten: bool,
    /// Map `C:\...` onto `/mnt/c/...`.
    pub posix_path_mode: bool,
    /// Turn cloud storage sharing links into direct downloads.
    pub cloud_boost: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("fail to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("fail to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("fail to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// User settings and counters, persisted as TOML.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub unshorten: bool,
    pub wsl_mode: bool,
    pub direct_link: bool,
    pub sound: bool,
    pub total_cleaned: u64,
    /// Most recent first.
    pub history: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            unshorten: false,
            wsl_mode: false,
            direct_link: true,
            sound: true,
            total_cleaned: 0,
            history: Vec::new(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Read the config at `path`. A missing file gives the defaults, so
    /// does a broken one, after a warning.
    pub fn load<P: AsRef<Path> + Debug>(path: P) -> Self {
        let content = match std::fs::read_to_string(path.as_ref()) {
            Ok(content) => content,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Config::default();
            }
            Err(error) => {
                tracing::warn!("fail to read config {path:?}: {error}");
                return Config::default();
            }
        };

        Self::parse(&content).unwrap_or_else(|error| {
            tracing::warn!("fail to parse config {path:?}, use defaults: {error}");
            Config::default()
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn options(&self) -> CleaningOptions {
        CleaningOptions {
            unshorten: self.unshorten,
            posix_path_mode: self.wsl_mode,
            cloud_boost: self.direct_link,
        }
    }

    /// Count a cleaned item and put it on top of the history.
    pub fn record(&mut self, cleaned: &str) {
        self.total_cleaned += 1;
        self.history.insert(0, cleaned.to_owned());
        self.history.truncate(HISTORY_LEN);
    }
}
