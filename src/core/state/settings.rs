use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::core::error::{LauncherError, LauncherResult};

pub const SETTINGS_FILE: &str = "launcher-settings.json";
pub const DEFAULT_RAM_MB: u32 = 4096;

pub fn default_java_path() -> &'static str {
    if cfg!(target_os = "windows") {
        "javaw.exe"
    } else {
        "java"
    }
}

/// User-editable launcher settings. Missing keys take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    #[serde(rename = "ramMB")]
    pub ram_mb: u32,
    #[serde(rename = "javaPath")]
    pub java_path: String,
    /// Local client jar used instead of the downloaded one, when it exists.
    #[serde(rename = "clientJar")]
    pub client_jar: Option<PathBuf>,
    #[serde(rename = "closeOnLaunch")]
    pub close_on_launch: bool,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            ram_mb: DEFAULT_RAM_MB,
            java_path: default_java_path().to_string(),
            client_jar: None,
            close_on_launch: false,
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Never fails: unreadable settings come back as defaults.
    async fn load(&self) -> LauncherSettings;
    async fn save(&self, settings: &LauncherSettings) -> LauncherResult<()>;
}

pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> LauncherResult<Option<LauncherSettings>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LauncherError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> LauncherSettings {
        match self.read().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                let defaults = LauncherSettings::default();
                info!("No settings at {:?}, writing defaults", self.path);
                if let Err(e) = self.save(&defaults).await {
                    error!("[Settings] Failed to write defaults: {}", e);
                }
                defaults
            }
            Err(e) => {
                error!("[Settings] Failed to load settings: {}", e);
                LauncherSettings::default()
            }
        }
    }

    async fn save(&self, settings: &LauncherSettings) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| LauncherError::Io {
                path: self.path.clone(),
                source: e,
            })
    }
}
