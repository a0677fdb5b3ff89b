use std::sync::Arc;

use reqwest::Client;

use crate::core::auth::AuthService;
use crate::core::downloader::{Downloader, Fetch, Origins, SourceFallbackResolver};
use crate::core::error::LauncherResult;
use crate::core::events::EventSink;
use crate::core::http::build_http_client;
use crate::core::libraries::{DependencyEnsurer, DependencyManifest};
use crate::core::version::VersionEnsurer;

use super::config::{InstallLayout, LauncherConfig};
use super::settings::{JsonSettingsStore, SettingsStore};

/// Everything the commands need, built once at startup.
pub struct AppState {
    pub layout: InstallLayout,
    pub origins: Origins,
    pub manifest: DependencyManifest,
    pub http_client: Client,
    pub fetcher: Arc<dyn Fetch>,
    pub dependencies: DependencyEnsurer,
    pub versions: VersionEnsurer,
    pub auth: AuthService,
    pub settings: Arc<dyn SettingsStore>,
    pub events: EventSink,
}

impl AppState {
    pub fn new(config: LauncherConfig, events: EventSink) -> LauncherResult<Self> {
        let http_client = build_http_client(config.connect_timeout)?;
        let fetcher: Arc<dyn Fetch> = Arc::new(Downloader::new(http_client.clone(), events.clone()));
        Ok(Self::with_fetcher(config, http_client, fetcher, events))
    }

    /// Same as [`new`](Self::new) with a caller-provided download backend.
    pub fn with_fetcher(
        config: LauncherConfig,
        http_client: Client,
        fetcher: Arc<dyn Fetch>,
        events: EventSink,
    ) -> Self {
        let settings: Arc<dyn SettingsStore> =
            Arc::new(JsonSettingsStore::new(config.settings_path.clone()));

        Self {
            dependencies: DependencyEnsurer::new(SourceFallbackResolver::new(
                fetcher.clone(),
                config.origins.clone(),
            )),
            versions: VersionEnsurer::new(fetcher.clone(), config.releases_base.clone()),
            auth: AuthService::new(http_client.clone(), config.auth),
            manifest: DependencyManifest::builtin(),
            layout: config.layout,
            origins: config.origins,
            http_client,
            fetcher,
            settings,
            events,
        }
    }
}
