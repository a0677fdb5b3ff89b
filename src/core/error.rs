use std::path::PathBuf;
use thiserror::Error;

use crate::core::auth::AuthStage;

/// Central error type for the entire launcher backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    // ── Authentication ──────────────────────────────────
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("You must sign in with Microsoft before launching.")]
    NotSignedIn,

    // ── Integrity ───────────────────────────────────────
    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    // ── Configuration ───────────────────────────────────
    #[error(transparent)]
    Config(#[from] ConfigError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Process ─────────────────────────────────────────
    #[error("Failed to start game process: {0}")]
    Spawn(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// A single download that could not be completed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Download failed for {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Transport error while downloading {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Cannot write download to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization code")]
    MissingCode,

    /// `stage` is the state the failed hop was trying to reach.
    #[error("Authentication failed at {stage}: {reason}")]
    ExchangeFailed { stage: AuthStage, reason: String },

    #[error("Game profile unavailable: {0}")]
    ProfileUnavailable(String),

    #[error("Timed out waiting for the sign-in callback")]
    TimedOut,
}

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("{path:?} is {size} bytes, expected at least {minimum}")]
    UndersizedArtifact {
        path: PathBuf,
        size: u64,
        minimum: u64,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required path is not available: {0}")]
    MissingRequiredPath(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

// Commands hand errors to the UI as plain messages.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_keep_their_message() {
        let err: LauncherError = FetchError::HttpStatus {
            url: "https://example.com/a.jar".into(),
            status: 404,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Download failed for https://example.com/a.jar: HTTP 404"
        );

        let err: LauncherError = AuthError::MissingCode.into();
        assert!(matches!(err, LauncherError::Auth(AuthError::MissingCode)));
    }

    #[test]
    fn exchange_failure_names_the_stage() {
        let err = AuthError::ExchangeFailed {
            stage: AuthStage::XstsTokenObtained,
            reason: "HTTP 401".into(),
        };
        assert_eq!(
            err.to_string(),
            "Authentication failed at XSTS token: HTTP 401"
        );
    }
}
