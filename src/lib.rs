pub mod commands;
pub mod core;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::core::auth::{SilentLogin, SystemBrowser};
use crate::core::error::LauncherResult;
use crate::core::events::{EventSink, LauncherEvent};
use crate::core::launch::{LaunchOptions, TokioSpawner};
use crate::core::state::{AppState, LauncherConfig};

/// Structured logging, `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ashlauncher_lib=debug")),
        )
        .try_init();
}

/// Headless launcher: restore or create a session, launch, wait for the game.
pub async fn run() -> LauncherResult<()> {
    info!("AshLauncher starting...");

    let config = LauncherConfig::detect()?;
    let (events, mut rx) = EventSink::channel(config.event_capacity);
    let state = AppState::new(config, events)?;

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                LauncherEvent::DownloadProgress(progress) if progress.percent == 100 => {
                    info!("[Download] {} done", progress.tracking_id)
                }
                LauncherEvent::DownloadProgress(_) => {}
                LauncherEvent::PlayState(play_state) => info!("[Play] {:?}", play_state),
            }
        }
    });

    let settings = commands::get_settings(&state).await;

    if let SilentLogin::NoPriorSession | SilentLogin::Unavailable(_) =
        state.auth.login_silent().await
    {
        warn!("No usable session, opening the Microsoft sign-in page");
        let account = commands::sign_in_microsoft(&state, &SystemBrowser).await?;
        info!("Signed in as {}", account.display_name);
    }

    let handle =
        commands::launch_minecraft(&state, LaunchOptions::default(), &TokioSpawner).await?;

    if settings.close_on_launch {
        info!("closeOnLaunch is set, leaving the game running");
        return Ok(());
    }

    if let Some(code) = handle.wait().await.filter(|code| *code != 0) {
        error!("Game exited with code {}", code);
    }
    Ok(())
}
