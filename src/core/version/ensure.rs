// ─── Version Ensurer ───
// The client jar and its version JSON must exist and look sane before
// anything else is prepared. "Sane" is a coarse minimum size per artifact;
// it catches empty or truncated files, not subtle corruption.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::downloader::Fetch;
use crate::core::error::{IntegrityError, LauncherError, LauncherResult};

pub const CLIENT_VERSION_ID: &str = "ashclient-1.8.9";
pub const RELEASES_BASE: &str = "https://raw.githubusercontent.com/ashclient/AshClient-CDN/main/releases/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ExecutableArchive,
    ManifestDescriptor,
}

impl ArtifactKind {
    /// Smallest size in bytes accepted as a valid file.
    pub const fn min_size(self) -> u64 {
        match self {
            ArtifactKind::ExecutableArchive => 10_000,
            ArtifactKind::ManifestDescriptor => 10,
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            ArtifactKind::ExecutableArchive => "jar",
            ArtifactKind::ManifestDescriptor => "json",
        }
    }
}

/// Local paths of the two launch-critical files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionArtifacts {
    pub executable_archive: PathBuf,
    pub manifest: PathBuf,
}

pub struct VersionEnsurer {
    fetcher: Arc<dyn Fetch>,
    releases_base: String,
    version_id: String,
}

impl VersionEnsurer {
    pub fn new(fetcher: Arc<dyn Fetch>, releases_base: impl Into<String>) -> Self {
        Self {
            fetcher,
            releases_base: releases_base.into(),
            version_id: CLIENT_VERSION_ID.into(),
        }
    }

    pub fn version_id(&self) -> &str {
        &self.version_id
    }

    /// `versions/<id>/<id>.jar` and `.json` under `game_dir`.
    pub fn expected_paths(&self, game_dir: &Path) -> VersionArtifacts {
        let root = self.version_root(game_dir);
        VersionArtifacts {
            executable_archive: root.join(self.file_name(ArtifactKind::ExecutableArchive)),
            manifest: root.join(self.file_name(ArtifactKind::ManifestDescriptor)),
        }
    }

    /// Make sure both artifacts pass their size check, downloading each one
    /// at most once. A file still undersized after its download is an
    /// [`IntegrityError`].
    pub async fn ensure_version(&self, game_dir: &Path) -> LauncherResult<VersionArtifacts> {
        let root = self.version_root(game_dir);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| LauncherError::Io {
                path: root.clone(),
                source: e,
            })?;

        let artifacts = self.expected_paths(game_dir);
        self.ensure_artifact(ArtifactKind::ExecutableArchive, &artifacts.executable_archive)
            .await?;
        self.ensure_artifact(ArtifactKind::ManifestDescriptor, &artifacts.manifest)
            .await?;
        Ok(artifacts)
    }

    async fn ensure_artifact(&self, kind: ArtifactKind, path: &Path) -> LauncherResult<()> {
        match local_size(path).await {
            Some(size) if size >= kind.min_size() => return Ok(()),
            Some(size) => warn!(
                "{:?} is only {} bytes (< {}), downloading again",
                path,
                size,
                kind.min_size()
            ),
            None => {}
        }

        let file_name = self.file_name(kind);
        let url = format!("{}/{}", self.releases_base.trim_end_matches('/'), file_name);
        let tracking_id = format!("{}-{}", self.version_id, kind.extension());

        info!("Downloading {}", file_name);
        self.fetcher.fetch(&url, path, &tracking_id).await?;

        let size = local_size(path).await.unwrap_or(0);
        if size < kind.min_size() {
            return Err(IntegrityError::UndersizedArtifact {
                path: path.to_path_buf(),
                size,
                minimum: kind.min_size(),
            }
            .into());
        }
        Ok(())
    }

    fn version_root(&self, game_dir: &Path) -> PathBuf {
        game_dir.join("versions").join(&self.version_id)
    }

    fn file_name(&self, kind: ArtifactKind) -> String {
        format!("{}.{}", self.version_id, kind.extension())
    }
}

/// Size of a regular file, `None` if it does not exist.
async fn local_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path)
        .await
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}
