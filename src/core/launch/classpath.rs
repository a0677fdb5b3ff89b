// ─── Classpath Builder ───
// Constructs the classpath string for launching the client.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::libraries::ResourcePath;

/// Jars that precede the general libraries, in this order.
#[derive(Debug, Clone)]
pub struct LeadingJars {
    pub client_jar: PathBuf,
    pub vanilla_jar: PathBuf,
    pub discord_rpc_jar: PathBuf,
}

/// Client jar, vanilla jar, Discord RPC jar, then every library in manifest
/// order, joined with the platform separator.
pub fn build_classpath(
    leading: &LeadingJars,
    libraries: &[ResourcePath],
    libraries_dir: &Path,
) -> LauncherResult<String> {
    let mut entries: Vec<String> = [
        &leading.client_jar,
        &leading.vanilla_jar,
        &leading.discord_rpc_jar,
    ]
    .into_iter()
    .map(|path| safe_path_str(path))
    .collect();

    entries.extend(
        libraries
            .iter()
            .filter(|library| !library.is_empty())
            .map(|library| safe_path_str(&library.to_local(libraries_dir))),
    );

    dedup_preserving_order(&mut entries);
    entries.retain(|entry| !entry.trim().is_empty());

    if entries.is_empty() {
        return Err(LauncherError::Other(
            "Classpath is empty after filtering invalid entries".into(),
        ));
    }

    debug!("Classpath has {} entries", entries.len());
    Ok(entries.join(get_classpath_separator()))
}

/// Platform-specific Java classpath separator.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

fn dedup_preserving_order(entries: &mut Vec<String>) {
    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.clone()));
}

/// Convert path to string, canonical when the file exists.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // Java fails to load jars given as extended-length paths (`\\?\C:\...`).
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}
