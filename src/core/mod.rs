// ─── AshLauncher Core ───
// Backend of a single-client Minecraft 1.8.9 launcher.
//
// Architecture:
//   core/
//     auth/       Microsoft → Xbox → Minecraft sign-in, session state
//     downloader/ Streaming fetcher + two-origin fallback resolver
//     libraries/  Resource paths, built-in manifest, ensurer, natives
//     version/    Client jar + version JSON with size checks
//     launch/     Classpath, command line, process spawn + monitor
//     state/      Settings store, install layout, application state
//     events      Progress and play-state channel to the UI
//     http        Shared HTTP client

pub mod auth;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod launch;
pub mod libraries;
pub mod state;
pub mod version;
