use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};

use super::msa::FederatedToken;

/// Access tokens closer than this to expiry are refreshed instead of reused.
const EXPIRY_MARGIN_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedAccount {
    pub home_account_id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedAccount {
    /// Builds the cache entry for a fresh grant. Fields the grant does not
    /// carry (refresh responses often omit the id_token) come from `previous`.
    pub fn from_token(token: &FederatedToken, previous: Option<&CachedAccount>) -> Self {
        let claims = token.claims.clone().unwrap_or_default();
        let home_account_id = claims
            .oid
            .or(claims.sub)
            .or_else(|| previous.map(|p| p.home_account_id.clone()))
            .unwrap_or_else(|| "default".to_string());
        let username = claims
            .preferred_username
            .or_else(|| previous.map(|p| p.username.clone()))
            .unwrap_or_else(|| "Player".to_string());

        Self {
            home_account_id,
            username,
            name: claims.name.or_else(|| previous.and_then(|p| p.name.clone())),
            access_token: token.access_token.clone(),
            refresh_token: token
                .refresh_token
                .clone()
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            expires_at: token.expires_at,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }

    pub fn access_token_usable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::minutes(EXPIRY_MARGIN_MINUTES) > now
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    accounts: Vec<CachedAccount>,
}

/// Microsoft accounts persisted between runs, stored as one JSON document.
#[derive(Debug)]
pub struct TokenCache {
    path: PathBuf,
    accounts: Vec<CachedAccount>,
    changed: bool,
}

impl TokenCache {
    /// Missing or empty files load as an empty cache.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let accounts = match tokio::fs::read_to_string(path).await {
            Ok(raw) if raw.trim().is_empty() => Vec::new(),
            Ok(raw) => serde_json::from_str::<CacheFile>(&raw)?.accounts,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No token cache at {:?}", path);
                Vec::new()
            }
            Err(e) => {
                return Err(LauncherError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            accounts,
            changed: false,
        })
    }

    pub fn accounts(&self) -> &[CachedAccount] {
        &self.accounts
    }

    pub fn upsert(&mut self, account: CachedAccount) {
        match self
            .accounts
            .iter_mut()
            .find(|a| a.home_account_id == account.home_account_id)
        {
            Some(existing) if *existing == account => return,
            Some(existing) => *existing = account,
            None => self.accounts.push(account),
        }
        self.changed = true;
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Writes the cache back, only if something changed since load.
    pub async fn save(&mut self) -> LauncherResult<()> {
        if !self.changed {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let json = serde_json::to_string_pretty(&CacheFile {
            accounts: self.accounts.clone(),
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| LauncherError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        self.changed = false;
        info!("Token cache saved to {:?}", self.path);
        Ok(())
    }
}
