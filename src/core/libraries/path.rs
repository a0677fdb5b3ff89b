use std::fmt;
use std::path::{Path, PathBuf};

/// A slash-separated path relative to a distribution origin or to a local
/// libraries root.
///
/// Construction normalizes the input: backslashes become `/`, and `..`, `.`,
/// empty and drive-qualified segments are dropped, so the result can never
/// climb out of the root it is joined onto.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn new(raw: &str) -> Self {
        let normalized = raw.replace('\\', "/");
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|segment| !segment.is_empty())
            .filter(|segment| *segment != "." && *segment != "..")
            .filter(|segment| !segment.contains(':'))
            .collect();
        Self(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment, e.g. `guava-17.0.jar`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Map onto a local directory, one path component per segment.
    pub fn to_local(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.0.split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }

    /// Full URL under a base such as `https://libraries.minecraft.net/`.
    pub fn url_under(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.0)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
