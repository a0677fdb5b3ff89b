// ─── Xbox / Minecraft relay ───
// Shared tail of every login: Microsoft access token → Xbox Live user token
// → XSTS token → Minecraft access token → game profile.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::AuthError;

use super::endpoints::AuthEndpoints;
use super::{AuthStage, AuthTrace};

const XBL_CONTRACT_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameProfile {
    pub id: Uuid,
    pub name: String,
}

/// The profile lookup is allowed to come back empty (account without the game).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileStatus {
    Resolved(GameProfile),
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub game_access_token: String,
    pub profile: ProfileStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XboxTokenResponse {
    token: String,
    display_claims: DisplayClaims,
}

#[derive(Debug, Deserialize)]
struct DisplayClaims {
    xui: Vec<UserHash>,
}

#[derive(Debug, Deserialize)]
struct UserHash {
    uhs: String,
}

#[derive(Debug, Deserialize)]
struct XstsErrorBody {
    #[serde(rename = "XErr")]
    xerr: u64,
}

#[derive(Debug, Deserialize)]
struct GameLoginResponse {
    access_token: String,
}

/// Readable reason for the XSTS `XErr` codes users actually hit.
pub fn describe_xerr(code: u64) -> String {
    match code {
        2148916233 => "This Microsoft account has no Xbox account. Sign in at xbox.com once, then try again.".into(),
        2148916235 => "Xbox Live is not available in this account's country or region.".into(),
        2148916236 | 2148916237 => "This account needs adult verification on xbox.com.".into(),
        2148916238 => "This is a child account. An adult must add it to a Microsoft family first.".into(),
        other => format!("Xbox Live refused the sign-in (XErr {other})"),
    }
}

pub struct XboxAuthChain {
    http: Client,
    endpoints: AuthEndpoints,
    timeout: Duration,
}

impl XboxAuthChain {
    pub fn new(http: Client, endpoints: AuthEndpoints, timeout: Duration) -> Self {
        Self {
            http,
            endpoints,
            timeout,
        }
    }

    /// Runs the four hops, advancing `trace` after each one. A missing game
    /// profile does not fail the chain.
    pub async fn run(
        &self,
        ms_access_token: &str,
        trace: &mut AuthTrace,
    ) -> Result<ChainOutcome, AuthError> {
        let (xbl_token, user_hash) = self.user_token(ms_access_token).await?;
        trace.advance(AuthStage::XboxUserTokenObtained);

        let xsts_token = self.xsts_token(&xbl_token).await?;
        trace.advance(AuthStage::XstsTokenObtained);

        let game_access_token = self.game_token(&user_hash, &xsts_token).await?;
        trace.advance(AuthStage::GameAccessTokenObtained);

        let profile = match self.fetch_profile(&game_access_token).await {
            Ok(profile) => {
                info!("Minecraft profile: {} ({})", profile.name, profile.id);
                ProfileStatus::Resolved(profile)
            }
            Err(err) => {
                warn!("Minecraft profile unavailable: {}", err);
                ProfileStatus::Unavailable(err.to_string())
            }
        };
        trace.advance(AuthStage::ProfileResolved);

        Ok(ChainOutcome {
            game_access_token,
            profile,
        })
    }

    async fn user_token(&self, ms_access_token: &str) -> Result<(String, String), AuthError> {
        let stage = AuthStage::XboxUserTokenObtained;
        let body = json!({
            "Properties": {
                "AuthMethod": "RPS",
                "SiteName": "user.auth.xboxlive.com",
                "RpsTicket": format!("d={ms_access_token}"),
            },
            "RelyingParty": "http://auth.xboxlive.com",
            "TokenType": "JWT",
        });

        let response = self.send(self.xbox_post(&self.endpoints.xbox_user, &body), stage).await?;
        if !response.status().is_success() {
            return Err(failed(stage, format!("HTTP {}", response.status().as_u16())));
        }
        let parsed: XboxTokenResponse = read_json(response, stage).await?;
        let user_hash = parsed
            .display_claims
            .xui
            .into_iter()
            .next()
            .map(|claim| claim.uhs)
            .ok_or_else(|| failed(stage, "response carries no user hash".into()))?;
        Ok((parsed.token, user_hash))
    }

    async fn xsts_token(&self, xbl_token: &str) -> Result<String, AuthError> {
        let stage = AuthStage::XstsTokenObtained;
        let body = json!({
            "Properties": {
                "SandboxId": "RETAIL",
                "UserTokens": [xbl_token],
            },
            "RelyingParty": "rp://api.minecraftservices.com/",
            "TokenType": "JWT",
        });

        let response = self.send(self.xbox_post(&self.endpoints.xsts, &body), stage).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let reason = match response.json::<XstsErrorBody>().await {
                Ok(body) => describe_xerr(body.xerr),
                Err(_) => "HTTP 401".to_string(),
            };
            return Err(failed(stage, reason));
        }
        if !status.is_success() {
            return Err(failed(stage, format!("HTTP {}", status.as_u16())));
        }
        let parsed: XboxTokenResponse = read_json(response, stage).await?;
        Ok(parsed.token)
    }

    async fn game_token(&self, user_hash: &str, xsts_token: &str) -> Result<String, AuthError> {
        let stage = AuthStage::GameAccessTokenObtained;
        let request = self
            .http
            .post(&self.endpoints.game_login)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&json!({ "identityToken": format!("XBL3.0 x={user_hash};{xsts_token}") }));

        let response = self.send(request, stage).await?;
        if !response.status().is_success() {
            return Err(failed(stage, format!("HTTP {}", response.status().as_u16())));
        }
        let parsed: GameLoginResponse = read_json(response, stage).await?;
        Ok(parsed.access_token)
    }

    pub async fn fetch_profile(&self, game_access_token: &str) -> Result<GameProfile, AuthError> {
        let request = self
            .http
            .get(&self.endpoints.game_profile)
            .bearer_auth(game_access_token);

        let response = self
            .send(request, AuthStage::ProfileResolved)
            .await
            .map_err(|e| AuthError::ProfileUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::ProfileUnavailable(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }
        response
            .json::<GameProfile>()
            .await
            .map_err(|e| AuthError::ProfileUnavailable(e.to_string()))
    }

    fn xbox_post(&self, url: &str, body: &serde_json::Value) -> RequestBuilder {
        self.http
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("x-xbl-contract-version", XBL_CONTRACT_VERSION)
            .json(body)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        stage: AuthStage,
    ) -> Result<reqwest::Response, AuthError> {
        request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| failed(stage, e.to_string()))
    }
}

fn failed(stage: AuthStage, reason: String) -> AuthError {
    AuthError::ExchangeFailed { stage, reason }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    stage: AuthStage,
) -> Result<T, AuthError> {
    response
        .json::<T>()
        .await
        .map_err(|e| failed(stage, format!("unreadable response: {e}")))
}
