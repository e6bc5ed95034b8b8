use crate::core::error_bus::BusError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "open-press.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl PluginConfig {
    pub fn from_json(source: &str, origin: &str) -> Result<Self, BusError> {
        serde_json::from_str(source)
            .map_err(|err| BusError::ConfigInvalid(origin.to_string(), err.to_string()))
    }
}

/// Where the ordered list of plugin names comes from. Read once per bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginConfigSource {
    File(PathBuf),
    Inline(Vec<String>),
}

impl Default for PluginConfigSource {
    /// `open-press.json` in the process working directory.
    fn default() -> Self {
        PluginConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

impl PluginConfigSource {
    /// A missing file means "no plugins"; an unreadable or malformed one is an error.
    pub async fn load(&self) -> Result<PluginConfig, BusError> {
        match self {
            PluginConfigSource::Inline(plugins) => Ok(PluginConfig {
                plugins: plugins.clone(),
            }),
            PluginConfigSource::File(path) => {
                let origin = path.display().to_string();
                match tokio::fs::read_to_string(path).await {
                    Ok(source) => PluginConfig::from_json(&source, &origin),
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        #[cfg(feature = "logging")]
                        log::info!("No plugin configuration at '{}', starting without plugins", origin);

                        Ok(PluginConfig::default())
                    }
                    Err(err) => Err(BusError::ConfigRead(origin, err.to_string())),
                }
            }
        }
    }
}
