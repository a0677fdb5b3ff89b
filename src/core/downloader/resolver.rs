// ─── Source Fallback ───
// Library artifacts are addressed by relative path and can come from the
// vendor host or from the project mirror, in that order.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::error::FetchError;
use crate::core::libraries::ResourcePath;

use super::client::Fetch;

pub const VENDOR_LIBRARIES_BASE: &str = "https://libraries.minecraft.net/";
pub const PROJECT_MIRROR_BASE: &str = "https://raw.githubusercontent.com/ashclient/AshClient-CDN/main/";

/// The two distribution origins sharing one relative-path scheme.
#[derive(Debug, Clone)]
pub struct Origins {
    pub primary: String,
    pub secondary: String,
}

impl Default for Origins {
    fn default() -> Self {
        Self {
            primary: VENDOR_LIBRARIES_BASE.into(),
            secondary: PROJECT_MIRROR_BASE.into(),
        }
    }
}

/// Tries the primary origin, then the mirror. No retries beyond that.
#[derive(Clone)]
pub struct SourceFallbackResolver {
    fetcher: Arc<dyn Fetch>,
    origins: Origins,
}

impl SourceFallbackResolver {
    pub fn new(fetcher: Arc<dyn Fetch>, origins: Origins) -> Self {
        Self { fetcher, origins }
    }

    pub fn origins(&self) -> &Origins {
        &self.origins
    }

    /// Download `path` into `dest`. Only the mirror's error is returned.
    pub async fn resolve(&self, path: &ResourcePath, dest: &Path) -> Result<(), FetchError> {
        let tracking_id = format!("lib:{}", path);

        let primary = path.url_under(&self.origins.primary);
        match self.fetcher.fetch(&primary, dest, &tracking_id).await {
            Ok(()) => return Ok(()),
            Err(err) => debug!("Primary origin failed for {}: {}", path, err),
        }

        let secondary = path.url_under(&self.origins.secondary);
        self.fetcher
            .fetch(&secondary, dest, &tracking_id)
            .await
            .inspect_err(|err| warn!("Mirror also failed for {}: {}", path, err))
    }
}
