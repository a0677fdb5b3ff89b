use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Unpack one native archive into `natives_dir`.
///
/// Everything except `META-INF/` is extracted, keeping the archive's
/// directory layout. Entries whose names would land outside `natives_dir`
/// are skipped. Returns the number of files written.
pub async fn extract_archive(archive: &Path, natives_dir: &Path) -> LauncherResult<usize> {
    let jar_bytes = tokio::fs::read(archive)
        .await
        .map_err(|e| LauncherError::Io {
            path: archive.to_path_buf(),
            source: e,
        })?;

    let dest_dir = natives_dir.to_path_buf();
    tokio::task::spawn_blocking(move || unpack(jar_bytes, &dest_dir))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
}

fn unpack(jar_bytes: Vec<u8>, dest_dir: &Path) -> LauncherResult<usize> {
    let cursor = std::io::Cursor::new(jar_bytes);
    let mut archive = zip::ZipArchive::new(cursor)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            debug!("Skipping unsafe entry name: {}", file.name());
            continue;
        };
        if relative.starts_with("META-INF") {
            continue;
        }

        let dest: PathBuf = dest_dir.join(&relative);
        if file.is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| LauncherError::Io {
                path: dest.clone(),
                source: e,
            })?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let mut out = std::fs::File::create(&dest).map_err(|e| LauncherError::Io {
            path: dest.clone(),
            source: e,
        })?;
        std::io::copy(&mut file, &mut out).map_err(|e| LauncherError::Io {
            path: dest.clone(),
            source: e,
        })?;
        written += 1;
        debug!("Extracted native: {}", relative.display());
    }

    Ok(written)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    /// Builds a small jar with the given `(name, contents)` entries.
    pub(crate) fn jar_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            for (name, contents) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[tokio::test]
    async fn extracts_everything_but_meta_inf() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("natives.jar");
        std::fs::write(
            &jar,
            jar_with(&[
                ("lwjgl64.dll", b"dll"),
                ("OpenAL64.dll", b"openal"),
                ("sub/extra.bin", b"extra"),
                ("META-INF/MANIFEST.MF", b"manifest"),
            ]),
        )
        .unwrap();

        let natives = temp.path().join("natives");
        let written = extract_archive(&jar, &natives).await.unwrap();

        assert_eq!(written, 3);
        assert_eq!(std::fs::read(natives.join("lwjgl64.dll")).unwrap(), b"dll");
        assert!(natives.join("sub").join("extra.bin").exists());
        assert!(!natives.join("META-INF").exists());
    }

    #[tokio::test]
    async fn corrupt_archive_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let jar = temp.path().join("broken.jar");
        std::fs::write(&jar, b"this is not a zip").unwrap();

        let err = extract_archive(&jar, &temp.path().join("natives"))
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::Zip(_)));
    }
}
