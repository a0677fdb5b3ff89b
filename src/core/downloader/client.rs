use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::FetchError;
use crate::core::events::{DownloadProgressEvent, EventSink};

/// Single-resource download.
///
/// Seam between the ensurers and the network so batch logic can be tested
/// without an HTTP server.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path, tracking_id: &str) -> Result<(), FetchError>;
}

/// Streaming downloader with progress reporting.
pub struct Downloader {
    client: Client,
    events: EventSink,
}

impl Downloader {
    pub fn new(client: Client, events: EventSink) -> Self {
        Self { client, events }
    }

    // ── Single file download ────────────────────────────

    /// Stream `url` into `dest`.
    ///
    /// Bytes go to a sibling `.part` file which is renamed over `dest` only
    /// after the body completed, so a failed transfer never leaves a
    /// truncated file under the final name.
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        tracking_id: &str,
    ) -> Result<(), FetchError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let partial = partial_path(dest);
        let result = self.stream_to(url, &partial, tracking_id).await;

        match result {
            Ok(()) => tokio::fs::rename(&partial, dest)
                .await
                .map_err(|source| FetchError::Io {
                    path: dest.to_path_buf(),
                    source,
                })?,
            Err(err) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(err);
            }
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }

    async fn stream_to(&self, url: &str, partial: &Path, tracking_id: &str) -> Result<(), FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };
        let write_err = |source| FetchError::Io {
            path: partial.to_path_buf(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(partial).await.map_err(write_err)?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport)?;
            file.write_all(&chunk).await.map_err(write_err)?;
            downloaded += chunk.len() as u64;

            self.events.progress(DownloadProgressEvent {
                tracking_id: tracking_id.to_string(),
                bytes_downloaded: downloaded,
                bytes_total: total,
                percent: percent_of(downloaded, total),
            });
        }

        file.flush().await.map_err(write_err)?;
        // Close before the rename; Windows refuses to move open files.
        drop(file);

        let final_total = if total > 0 { total } else { downloaded };
        self.events.progress(DownloadProgressEvent {
            tracking_id: tracking_id.to_string(),
            bytes_downloaded: final_total,
            bytes_total: final_total,
            percent: 100,
        });

        Ok(())
    }
}

#[async_trait]
impl Fetch for Downloader {
    async fn fetch(&self, url: &str, dest: &Path, tracking_id: &str) -> Result<(), FetchError> {
        self.download_file(url, dest, tracking_id).await
    }
}

/// Whole-number percentage, 0 when the length is unknown.
fn percent_of(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (downloaded.saturating_mul(100) / total).min(100) as u8
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("download"));
    name.push(".part");
    dest.with_file_name(name)
}
