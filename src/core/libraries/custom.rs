// ─── Client resources ───
// Two files only the project mirror serves. Fetched directly, without the
// vendor fallback, and only when missing.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::downloader::Fetch;
use crate::core::error::LauncherResult;

use super::path::ResourcePath;

pub const CLIENT_INPUT_DLL: &str = "resources/ClientInput.dll";
pub const DISCORD_RPC_JAR: &str = "resources/java-discord-rpc-2.0.1-all.jar";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomResources {
    /// Lives next to the extracted natives.
    pub client_input_dll: PathBuf,
    /// Lives in launcher storage and goes on the classpath.
    pub discord_rpc_jar: PathBuf,
}

impl CustomResources {
    pub fn locate(natives_dir: &Path, storage_dir: &Path) -> Self {
        Self {
            client_input_dll: natives_dir.join(ResourcePath::new(CLIENT_INPUT_DLL).file_name()),
            discord_rpc_jar: storage_dir.join(ResourcePath::new(DISCORD_RPC_JAR).file_name()),
        }
    }
}

/// Makes sure both resources exist. A failed download is returned as is.
pub async fn ensure_custom_resources(
    fetcher: &dyn Fetch,
    mirror_base: &str,
    natives_dir: &Path,
    storage_dir: &Path,
) -> LauncherResult<CustomResources> {
    let resources = CustomResources::locate(natives_dir, storage_dir);
    let wanted = [
        (CLIENT_INPUT_DLL, &resources.client_input_dll, "clientinput-dll"),
        (DISCORD_RPC_JAR, &resources.discord_rpc_jar, "discord-rpc"),
    ];

    for (relative, local, tracking_id) in wanted {
        if tokio::fs::try_exists(local).await.unwrap_or(false) {
            continue;
        }
        info!("Downloading {}", relative);
        let url = ResourcePath::new(relative).url_under(mirror_base);
        fetcher.fetch(&url, local, tracking_id).await?;
    }

    Ok(resources)
}
