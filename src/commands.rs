// ─── Commands ───
// Entry points the UI layer calls. Each one takes the shared state explicitly.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::auth::{AuthorizationOpener, GameCredential, SilentLogin};
use crate::core::error::LauncherError;
use crate::core::events::PlayState;
use crate::core::launch::{
    build_classpath, build_launch_command, monitor, LaunchHandle, LaunchOptions, LaunchSpec,
    LeadingJars, ProcessSpawner,
};
use crate::core::libraries::ensure_custom_resources;
use crate::core::state::{AppState, LauncherSettings};

pub async fn get_settings(state: &AppState) -> LauncherSettings {
    state.settings.load().await
}

pub async fn save_settings(
    state: &AppState,
    settings: LauncherSettings,
) -> Result<LauncherSettings, LauncherError> {
    state.settings.save(&settings).await?;
    info!(
        "Settings saved (ram={}MB, java={})",
        settings.ram_mb, settings.java_path
    );
    Ok(settings)
}

/// The signed-in account, if any. The access token is never serialized.
pub async fn get_account(state: &AppState) -> Option<GameCredential> {
    state.auth.current().await
}

pub async fn sign_in_microsoft(
    state: &AppState,
    opener: &dyn AuthorizationOpener,
) -> Result<GameCredential, LauncherError> {
    state.auth.sign_in(opener).await
}

/// Prepares every file the client needs and starts the game.
///
/// Order matters: the session is refreshed and checked first, so a launch
/// without a usable account fails before any download.
pub async fn launch_minecraft(
    state: &AppState,
    options: LaunchOptions,
    spawner: &dyn ProcessSpawner,
) -> Result<LaunchHandle, LauncherError> {
    let settings = state.settings.load().await;

    if let SilentLogin::Unavailable(reason) = state.auth.login_silent().await {
        warn!("[Auth] Silent refresh before launch failed: {}", reason);
    }
    let credential = state
        .auth
        .current()
        .await
        .filter(GameCredential::is_launchable)
        .ok_or(LauncherError::NotSignedIn)?;

    let (java_path, ram_mb) = options.resolve(&settings);
    let layout = &state.layout;
    let libraries_dir = layout.libraries_dir();
    let version_id = state.versions.version_id().to_string();
    let natives_dir = layout.natives_dir(&version_id);

    // 1. Client version files
    let artifacts = state.versions.ensure_version(&layout.game_dir).await?;

    // 2. Libraries
    let libraries = state
        .dependencies
        .ensure_all(&state.manifest.libraries, &libraries_dir)
        .await?;
    if !libraries.is_complete() {
        warn!(
            "{} libraries could not be downloaded, launching anyway",
            libraries.failed.len()
        );
    }

    // 3. Natives
    let natives = state
        .dependencies
        .ensure_natives(&state.manifest.natives, &libraries_dir, &natives_dir)
        .await?;
    if !natives.is_complete() {
        warn!("Some native archives are missing or unreadable");
    }

    // 4. Client resources
    let resources = ensure_custom_resources(
        state.fetcher.as_ref(),
        &state.origins.secondary,
        &natives_dir,
        &layout.storage_dir,
    )
    .await?;

    let vanilla_jar = layout.vanilla_jar();
    if !vanilla_jar.exists() {
        warn!(
            "Vanilla jar not found at {:?}; install 1.8.9 with the official launcher",
            vanilla_jar
        );
    }

    let client_jar =
        pick_client_jar(settings.client_jar.as_deref(), artifacts.executable_archive);
    let classpath = build_classpath(
        &LeadingJars {
            client_jar,
            vanilla_jar,
            discord_rpc_jar: resources.discord_rpc_jar,
        },
        &state.manifest.libraries,
        &libraries_dir,
    )?;

    let command = build_launch_command(&LaunchSpec {
        java_path: &java_path,
        ram_mb,
        classpath: &classpath,
        natives_dir: &natives_dir,
        game_dir: &layout.game_dir,
        assets_dir: &layout.assets_dir(),
        version_id: &version_id,
        credential: &credential,
    })?;
    info!("[Launcher] Launching {} as {}", version_id, credential.display_name);

    state.events.play_state(PlayState::Launching);
    let process = match spawner.spawn(&command).await {
        Ok(process) => process,
        Err(err) => {
            state.events.play_state(PlayState::Idle);
            return Err(err);
        }
    };

    Ok(monitor(process, &version_id, state.events.clone()))
}

/// A configured `clientJar` that exists replaces the downloaded client jar.
fn pick_client_jar(configured: Option<&Path>, downloaded: PathBuf) -> PathBuf {
    match configured.filter(|path| !path.as_os_str().is_empty()) {
        Some(path) if path.is_file() => {
            info!("[Launcher] Using configured client jar {:?}", path);
            path.to_path_buf()
        }
        Some(path) => {
            warn!(
                "Configured client jar {:?} does not exist, using {:?}",
                path, downloaded
            );
            downloaded
        }
        None => downloaded,
    }
}
