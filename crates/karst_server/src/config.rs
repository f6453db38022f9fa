use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use karst_shared::worldgen::WorldgenSettings;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Worker thread count; `None` lets the pool size itself.
    pub threads: Option<usize>,
    pub worldgen: WorldgenSettings,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config: {err}"),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Loads `worldgen.toml`-style settings. A missing file simply yields the
/// defaults; a malformed file is an error the caller should surface.
pub fn load(path: &Path) -> Result<ServerSettings, ConfigError> {
    if !path.exists() {
        return Ok(ServerSettings::default());
    }
    let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&text).map_err(ConfigError::Parse)
}
