use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::auth::AuthConfig;
use crate::core::downloader::Origins;
use crate::core::error::ConfigError;
use crate::core::version::RELEASES_BASE;

use super::settings::SETTINGS_FILE;

const CONFIG_DIR_NAME: &str = "ashlauncher";
const STORAGE_DIR_NAME: &str = "ashclient";
const TOKEN_CACHE_FILE: &str = "msal_cache.json";
const VANILLA_VERSION: &str = "1.8.9";

/// Where the game and the launcher keep their files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub game_dir: PathBuf,
    /// Launcher-owned files outside the game directory (token cache, RPC jar).
    pub storage_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(game_dir: impl Into<PathBuf>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            game_dir: game_dir.into(),
            storage_dir: storage_dir.into(),
        }
    }

    pub fn detect() -> Result<Self, ConfigError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ConfigError::MissingRequiredPath("user data directory".into()))?;

        let game_dir = if cfg!(target_os = "windows") {
            data_dir.join(".minecraft")
        } else if cfg!(target_os = "macos") {
            data_dir.join("minecraft")
        } else {
            dirs::home_dir()
                .ok_or_else(|| ConfigError::MissingRequiredPath("home directory".into()))?
                .join(".minecraft")
        };

        Ok(Self::new(game_dir, data_dir.join(STORAGE_DIR_NAME)))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.game_dir.join("libraries")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.game_dir.join("versions")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.game_dir.join("assets")
    }

    pub fn natives_dir(&self, version_id: &str) -> PathBuf {
        self.game_dir.join("natives").join(version_id)
    }

    /// The stock 1.8.9 jar the client builds on. Installed by the official
    /// launcher, never downloaded here.
    pub fn vanilla_jar(&self) -> PathBuf {
        self.versions_dir()
            .join(VANILLA_VERSION)
            .join(format!("{VANILLA_VERSION}.jar"))
    }

    pub fn token_cache_path(&self) -> PathBuf {
        self.storage_dir.join(TOKEN_CACHE_FILE)
    }
}

/// Every fixed host, path and timeout the launcher uses.
pub struct LauncherConfig {
    pub layout: InstallLayout,
    pub settings_path: PathBuf,
    pub origins: Origins,
    pub releases_base: String,
    pub auth: AuthConfig,
    pub connect_timeout: Duration,
    /// Capacity of the event channel handed to the UI.
    pub event_capacity: usize,
}

impl LauncherConfig {
    pub fn detect() -> Result<Self, ConfigError> {
        let layout = InstallLayout::detect()?;
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::MissingRequiredPath("user config directory".into()))?;
        Ok(Self::for_layout(
            layout,
            &config_dir.join(CONFIG_DIR_NAME),
        ))
    }

    /// Production hosts around an arbitrary layout.
    pub fn for_layout(layout: InstallLayout, config_dir: &Path) -> Self {
        Self {
            auth: AuthConfig::new(layout.token_cache_path()),
            settings_path: config_dir.join(SETTINGS_FILE),
            origins: Origins::default(),
            releases_base: RELEASES_BASE.to_string(),
            connect_timeout: Duration::from_secs(15),
            event_capacity: 256,
            layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_follow_the_game_directory() {
        let layout = InstallLayout::new("/games/.minecraft", "/data/ashclient");

        assert_eq!(
            layout.libraries_dir(),
            PathBuf::from("/games/.minecraft/libraries")
        );
        assert_eq!(
            layout.natives_dir("ashclient-1.8.9"),
            PathBuf::from("/games/.minecraft/natives/ashclient-1.8.9")
        );
        assert_eq!(
            layout.vanilla_jar(),
            PathBuf::from("/games/.minecraft/versions/1.8.9/1.8.9.jar")
        );
        assert_eq!(
            layout.token_cache_path(),
            PathBuf::from("/data/ashclient/msal_cache.json")
        );
    }

    #[test]
    fn config_for_layout_uses_production_hosts() {
        let layout = InstallLayout::new("/g", "/s");
        let config = LauncherConfig::for_layout(layout.clone(), Path::new("/c/ashlauncher"));

        assert_eq!(config.layout, layout);
        assert_eq!(
            config.settings_path,
            PathBuf::from("/c/ashlauncher/launcher-settings.json")
        );
        assert_eq!(config.auth.token_cache_path, layout.token_cache_path());
        assert_eq!(config.releases_base, RELEASES_BASE);
        assert_eq!(config.auth.callback_addr.port(), 19191);
    }
}
