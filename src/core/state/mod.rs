pub mod app_state;
pub mod config;
pub mod settings;

pub use app_state::AppState;
pub use config::{InstallLayout, LauncherConfig};
pub use settings::{JsonSettingsStore, LauncherSettings, SettingsStore};
