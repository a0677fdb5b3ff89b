// ─── Microsoft Identity Provider ───
// Authorization-code and refresh-token grants against the consumers tenant.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::error::{AuthError, LauncherError, LauncherResult};

use super::endpoints::AuthEndpoints;
use super::AuthStage;

pub const MS_CLIENT_ID: &str = "0c76d921-5349-4799-92ea-9d9cf1808a4e";
pub const MS_SCOPES: &str = "XboxLive.signin offline_access openid profile";

/// Account details carried in the `id_token`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountClaims {
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

/// Result of a successful token grant.
#[derive(Debug, Clone)]
pub struct FederatedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub claims: Option<AccountClaims>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    id_token: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

pub struct IdentityClient {
    http: Client,
    endpoints: AuthEndpoints,
    client_id: String,
    timeout: Duration,
}

impl IdentityClient {
    pub fn new(
        http: Client,
        endpoints: AuthEndpoints,
        client_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            client_id: client_id.into(),
            timeout,
        }
    }

    /// Browser URL starting the authorization-code flow.
    pub fn authorization_url(&self, redirect_uri: &str) -> LauncherResult<String> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri),
                ("scope", MS_SCOPES),
                ("response_mode", "query"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| LauncherError::Other(format!("Invalid authorize endpoint: {e}")))?;
        Ok(url.into())
    }

    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<FederatedToken, AuthError> {
        debug!("Exchanging authorization code");
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("scope", MS_SCOPES),
        ])
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<FederatedToken, AuthError> {
        debug!("Refreshing Microsoft token");
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("scope", MS_SCOPES),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<FederatedToken, AuthError> {
        let failed = |reason: String| AuthError::ExchangeFailed {
            stage: AuthStage::FederatedTokenObtained,
            reason,
        };

        let response = self
            .http
            .post(&self.endpoints.token)
            .timeout(self.timeout)
            .form(form)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<OAuthErrorBody>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("HTTP {}", status.as_u16()),
            };
            warn!("Microsoft token request rejected: {}", reason);
            return Err(failed(reason));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("unreadable token response: {e}")))?;

        Ok(FederatedToken {
            claims: token.id_token.as_deref().and_then(decode_id_token),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(token.expires_in),
        })
    }
}

/// Payload of the `id_token`, signature not checked.
fn decode_id_token(jwt: &str) -> Option<AccountClaims> {
    let payload = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}
