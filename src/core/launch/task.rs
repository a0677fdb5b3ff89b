// ─── Launch Task ───
// Builds the client's command line and spawns the game process.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tracing::{debug, info};

use crate::core::auth::GameCredential;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::LauncherSettings;
use crate::core::state::settings::{default_java_path, DEFAULT_RAM_MB};

use super::classpath::safe_path_str;

pub const MAIN_CLASS: &str = "net.minecraft.client.main.Main";
pub const ASSET_INDEX: &str = "1.8";

/// Per-launch overrides coming from the UI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchOptions {
    #[serde(rename = "javaPath", default)]
    pub java_path: Option<String>,
    #[serde(rename = "ramMB", default)]
    pub ram_mb: Option<u32>,
}

impl LaunchOptions {
    /// Java binary and heap size: option, then stored setting, then default.
    pub fn resolve(&self, settings: &LauncherSettings) -> (String, u32) {
        let java_path = [self.java_path.as_deref(), Some(settings.java_path.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|path| !path.is_empty())
            .unwrap_or(default_java_path())
            .to_string();

        let ram_mb = [self.ram_mb, Some(settings.ram_mb)]
            .into_iter()
            .flatten()
            .find(|ram| *ram > 0)
            .unwrap_or(DEFAULT_RAM_MB);

        (java_path, ram_mb)
    }
}

/// Inputs of [`build_launch_command`].
pub struct LaunchSpec<'a> {
    pub java_path: &'a str,
    pub ram_mb: u32,
    pub classpath: &'a str,
    pub natives_dir: &'a Path,
    pub game_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub version_id: &'a str,
    pub credential: &'a GameCredential,
}

/// A fully resolved game command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub natives_dir: PathBuf,
}

pub fn build_launch_command(spec: &LaunchSpec<'_>) -> LauncherResult<LaunchCommand> {
    let credential = spec.credential;
    let uuid = match credential.game_profile_id {
        Some(id) if credential.is_launchable() => id,
        _ => return Err(LauncherError::NotSignedIn),
    };
    if spec.classpath.trim().is_empty() {
        return Err(LauncherError::Other(
            "Empty classpath: refusing to start java with an invalid -cp".into(),
        ));
    }

    let natives = safe_path_str(spec.natives_dir);
    let mut args = vec![
        format!("-Xmx{}m", spec.ram_mb),
        format!("-Djava.library.path={}", natives),
        format!("-Dorg.lwjgl.librarypath={}", natives),
        "-cp".to_string(),
        spec.classpath.to_string(),
        MAIN_CLASS.to_string(),
    ];

    let game_args: [(&str, String); 9] = [
        ("--version", spec.version_id.to_string()),
        ("--gameDir", safe_path_str(spec.game_dir)),
        ("--assetsDir", safe_path_str(spec.assets_dir)),
        ("--assetIndex", ASSET_INDEX.to_string()),
        ("--userType", "msa".to_string()),
        ("--versionType", "release".to_string()),
        ("--username", credential.display_name.clone()),
        ("--uuid", uuid.simple().to_string()),
        ("--accessToken", credential.game_access_token.clone()),
    ];
    for (flag, value) in game_args {
        args.push(flag.to_string());
        args.push(value);
    }

    Ok(LaunchCommand {
        program: spec.java_path.to_string(),
        args,
        working_dir: spec.game_dir.to_path_buf(),
        natives_dir: spec.natives_dir.to_path_buf(),
    })
}

impl LaunchCommand {
    /// Shell-pasteable command line with the access token masked.
    pub fn for_logs(&self) -> String {
        let mut parts = vec![shell_escape(&self.program)];
        let mut mask_next = false;
        for arg in &self.args {
            if mask_next {
                parts.push("<redacted>".to_string());
                mask_next = false;
                continue;
            }
            mask_next = arg == "--accessToken";
            parts.push(shell_escape(arg));
        }
        parts.join(" ")
    }
}

/// A started game process, reduced to what the monitor needs.
pub struct GameProcess {
    pub pid: Option<u32>,
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub stderr: Box<dyn AsyncRead + Send + Unpin>,
    /// Resolves with the exit code once the process is gone.
    pub exit: BoxFuture<'static, LauncherResult<Option<i32>>>,
}

#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    async fn spawn(&self, command: &LaunchCommand) -> LauncherResult<GameProcess>;
}

/// Spawns real child processes through `tokio::process`.
pub struct TokioSpawner;

#[async_trait]
impl ProcessSpawner for TokioSpawner {
    async fn spawn(&self, command: &LaunchCommand) -> LauncherResult<GameProcess> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_native_library_env(&mut cmd, &command.natives_dir);
        configure_platform_spawn(&mut cmd);

        info!("Launching client with Java: {}", command.program);
        debug!("Command (copy/paste): {}", command.for_logs());

        let mut child = cmd
            .spawn()
            .map_err(|e| LauncherError::Spawn(format!("{}: {}", command.program, e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LauncherError::Spawn("stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| LauncherError::Spawn("stderr was not captured".into()))?;

        Ok(GameProcess {
            pid: child.id(),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            exit: Box::pin(async move {
                child
                    .wait()
                    .await
                    .map(|status| status.code())
                    .map_err(LauncherError::from)
            }),
        })
    }
}

fn configure_native_library_env(cmd: &mut tokio::process::Command, natives_dir: &Path) {
    let var_name = native_search_var();
    cmd.env(var_name, append_env_path(var_name, &safe_path_str(natives_dir)));
}

fn native_search_var() -> &'static str {
    if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

fn configure_platform_spawn(cmd: &mut tokio::process::Command) {
    #[cfg(target_os = "windows")]
    {
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(CREATE_NO_WINDOW);

        // Terminal-related vars make LWJGL treat the process as a console session.
        cmd.env_remove("WT_SESSION");
        cmd.env_remove("TERM");
        cmd.env_remove("ConEmuANSI");
    }
    #[cfg(not(target_os = "windows"))]
    let _ = cmd;
}

fn append_env_path(var_name: &str, value: &str) -> String {
    let separator = if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    };
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, separator, existing)
        }
        _ => value.to_string(),
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
