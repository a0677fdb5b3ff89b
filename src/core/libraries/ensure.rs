// ─── Dependency Ensurer ───
// Makes every manifest entry exist on disk. Entries are handled one at a
// time and a failing entry never stops the rest of the batch.

use std::path::Path;

use tracing::{error, info, warn};

use crate::core::downloader::SourceFallbackResolver;
use crate::core::error::{FetchError, LauncherError, LauncherResult};

use super::natives::extract_archive;
use super::path::ResourcePath;

/// Outcome of one `ensure_*` pass.
#[derive(Debug, Default)]
pub struct EnsureReport {
    /// Already on disk, left untouched.
    pub present: Vec<ResourcePath>,
    pub downloaded: Vec<ResourcePath>,
    pub failed: Vec<(ResourcePath, FetchError)>,
    /// Archives that were on disk but could not be unpacked.
    pub extraction_failed: Vec<(ResourcePath, LauncherError)>,
}

impl EnsureReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.extraction_failed.is_empty()
    }
}

pub struct DependencyEnsurer {
    resolver: SourceFallbackResolver,
}

impl DependencyEnsurer {
    pub fn new(resolver: SourceFallbackResolver) -> Self {
        Self { resolver }
    }

    /// Guarantee each entry exists under `libraries_root`.
    ///
    /// Existing files count as satisfied without any integrity check.
    pub async fn ensure_all(
        &self,
        entries: &[ResourcePath],
        libraries_root: &Path,
    ) -> LauncherResult<EnsureReport> {
        create_dir(libraries_root).await?;

        let mut report = EnsureReport::default();
        for entry in entries {
            self.ensure_one(entry, libraries_root, &mut report).await;
        }

        info!(
            "Libraries: {} present, {} downloaded, {} failed",
            report.present.len(),
            report.downloaded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Like [`ensure_all`](Self::ensure_all), then unpack every archive that
    /// is available into `natives_dir`.
    pub async fn ensure_natives(
        &self,
        archives: &[ResourcePath],
        libraries_root: &Path,
        natives_dir: &Path,
    ) -> LauncherResult<EnsureReport> {
        create_dir(natives_dir).await?;
        let mut report = self.ensure_all(archives, libraries_root).await?;

        for archive in archives {
            if report.failed.iter().any(|(failed, _)| failed == archive) {
                continue;
            }
            let jar_path = archive.to_local(libraries_root);
            match extract_archive(&jar_path, natives_dir).await {
                Ok(count) => info!("Extracted {} files from {}", count, archive),
                Err(err) => {
                    error!("[Natives] Failed extracting {:?}: {}", jar_path, err);
                    report.extraction_failed.push((archive.clone(), err));
                }
            }
        }

        Ok(report)
    }

    async fn ensure_one(&self, entry: &ResourcePath, root: &Path, report: &mut EnsureReport) {
        let local = entry.to_local(root);
        if tokio::fs::try_exists(&local).await.unwrap_or(false) {
            report.present.push(entry.clone());
            return;
        }

        if let Some(parent) = local.parent() {
            if let Err(source) = tokio::fs::create_dir_all(parent).await {
                let err = FetchError::Io {
                    path: parent.to_path_buf(),
                    source,
                };
                warn!("[Library] Failed: {}: {}", entry, err);
                report.failed.push((entry.clone(), err));
                return;
            }
        }

        match self.resolver.resolve(entry, &local).await {
            Ok(()) => report.downloaded.push(entry.clone()),
            Err(err) => {
                error!("[Library] Failed: {}: {}", entry, err);
                report.failed.push((entry.clone(), err));
            }
        }
    }
}

async fn create_dir(path: &Path) -> LauncherResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| LauncherError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::downloader::{Fetch, Origins};
    use crate::core::libraries::natives::tests::jar_with;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// In-memory origin: serves bodies by URL and records every call.
    #[derive(Default)]
    pub(crate) struct RecordingFetcher {
        pub bodies: HashMap<String, Vec<u8>>,
        pub calls: Mutex<Vec<(String, PathBuf)>>,
    }

    impl RecordingFetcher {
        pub(crate) fn serving<B: AsRef<[u8]>>(bodies: &[(&str, B)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.as_ref().to_vec()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<(String, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for RecordingFetcher {
        async fn fetch(&self, url: &str, dest: &Path, _id: &str) -> Result<(), FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            match self.bodies.get(url) {
                Some(body) => {
                    std::fs::write(dest, body).unwrap();
                    Ok(())
                }
                None => Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn origins() -> Origins {
        Origins {
            primary: "https://vendor.test/".into(),
            secondary: "https://mirror.test/".into(),
        }
    }

    fn ensurer(fetcher: Arc<RecordingFetcher>) -> DependencyEnsurer {
        DependencyEnsurer::new(SourceFallbackResolver::new(fetcher, origins()))
    }

    #[tokio::test]
    async fn only_missing_entries_are_fetched() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("libraries");
        let entries: Vec<ResourcePath> = ["a/one.jar", "b/two.jar", "c/three.jar"]
            .into_iter()
            .map(ResourcePath::new)
            .collect();
        for present in &entries[..2] {
            let local = present.to_local(&root);
            std::fs::create_dir_all(local.parent().unwrap()).unwrap();
            std::fs::write(local, b"present").unwrap();
        }

        let fetcher = Arc::new(RecordingFetcher::serving(&[(
            "https://vendor.test/c/three.jar",
            b"three",
        )]));
        let report = ensurer(fetcher.clone())
            .ensure_all(&entries, &root)
            .await
            .unwrap();

        let calls = fetcher.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://vendor.test/c/three.jar");
        assert_eq!(calls[0].1, entries[2].to_local(&root));
        assert_eq!(report.present.len(), 2);
        assert_eq!(report.downloaded, vec![entries[2].clone()]);
    }

    #[tokio::test]
    async fn second_pass_over_populated_state_makes_no_calls() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("libraries");
        let entries = vec![ResourcePath::new("a/one.jar"), ResourcePath::new("b/two.jar")];
        let fetcher = Arc::new(RecordingFetcher::serving(&[
            ("https://vendor.test/a/one.jar", b"1"),
            ("https://mirror.test/b/two.jar", b"2"),
        ]));
        let ensurer = ensurer(fetcher.clone());

        let first = ensurer.ensure_all(&entries, &root).await.unwrap();
        assert!(first.is_complete());
        let calls_after_first = fetcher.calls().len();

        let second = ensurer.ensure_all(&entries, &root).await.unwrap();
        assert_eq!(fetcher.calls().len(), calls_after_first);
        assert_eq!(second.present.len(), 2);
        assert!(second.downloaded.is_empty());
    }

    #[tokio::test]
    async fn a_failing_entry_does_not_stop_the_batch() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("libraries");
        let entries = vec![
            ResourcePath::new("broken/x.jar"),
            ResourcePath::new("fine/y.jar"),
        ];
        let fetcher = Arc::new(RecordingFetcher::serving(&[(
            "https://vendor.test/fine/y.jar",
            b"y",
        )]));

        let report = ensurer(fetcher.clone())
            .ensure_all(&entries, &root)
            .await
            .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, entries[0]);
        assert_eq!(report.downloaded, vec![entries[1].clone()]);
        // primary + mirror for the broken one, primary for the fine one
        assert_eq!(fetcher.calls().len(), 3);
        assert!(!entries[0].to_local(&root).exists());
    }

    #[tokio::test]
    async fn natives_are_extracted_and_bad_archives_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("libraries");
        let natives = temp.path().join("natives");
        let good_jar = jar_with(&[("lwjgl64.dll", b"native"), ("META-INF/MANIFEST.MF", b"m")]);
        let archives = vec![
            ResourcePath::new("org/lwjgl/platform-natives-windows.jar"),
            ResourcePath::new("tv/twitch/corrupt-natives-windows.jar"),
            ResourcePath::new("net/missing-natives-windows.jar"),
        ];
        let fetcher = Arc::new(RecordingFetcher::serving(&[
            (
                "https://vendor.test/org/lwjgl/platform-natives-windows.jar",
                good_jar.as_slice(),
            ),
            (
                "https://vendor.test/tv/twitch/corrupt-natives-windows.jar",
                &b"garbage"[..],
            ),
        ]));

        let report = ensurer(fetcher)
            .ensure_natives(&archives, &root, &natives)
            .await
            .unwrap();

        assert_eq!(std::fs::read(natives.join("lwjgl64.dll")).unwrap(), b"native");
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, archives[2]);
        assert_eq!(report.extraction_failed.len(), 1);
        assert_eq!(report.extraction_failed[0].0, archives[1]);
        assert!(!report.is_complete());
    }
}
