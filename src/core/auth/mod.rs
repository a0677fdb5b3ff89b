// ─── Authentication ───
// Microsoft account → Xbox Live → XSTS → Minecraft services relay.
//
//   msa/         identity provider (authorize URL, code + refresh exchange)
//   token_cache  persisted Microsoft accounts and tokens
//   xbox         the shared tail of the relay, ending at the game profile
//   callback     loopback listener receiving the authorization code
//   service      session owner: silent / interactive login, current account

pub mod callback;
pub mod endpoints;
pub mod msa;
pub mod service;
pub mod token_cache;
pub mod xbox;

use std::fmt;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

pub use endpoints::AuthEndpoints;
pub use service::{AuthConfig, AuthService, AuthorizationOpener, SilentLogin, SystemBrowser};
pub use xbox::{ChainOutcome, GameProfile, ProfileStatus};

/// Position of a login attempt in the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStage {
    Unauthenticated,
    FederatedTokenObtained,
    XboxUserTokenObtained,
    XstsTokenObtained,
    GameAccessTokenObtained,
    ProfileResolved,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthStage::Unauthenticated => "unauthenticated",
            AuthStage::FederatedTokenObtained => "Microsoft token",
            AuthStage::XboxUserTokenObtained => "Xbox Live user token",
            AuthStage::XstsTokenObtained => "XSTS token",
            AuthStage::GameAccessTokenObtained => "Minecraft access token",
            AuthStage::ProfileResolved => "Minecraft profile",
        };
        f.write_str(label)
    }
}

/// Ordered record of the stages one login attempt went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTrace(Vec<AuthStage>);

impl AuthTrace {
    pub fn start() -> Self {
        Self(vec![AuthStage::Unauthenticated])
    }

    pub fn advance(&mut self, stage: AuthStage) {
        debug!("Auth stage reached: {}", stage);
        self.0.push(stage);
    }

    pub fn stages(&self) -> &[AuthStage] {
        &self.0
    }

    pub fn reached(&self) -> AuthStage {
        self.0.last().copied().unwrap_or(AuthStage::Unauthenticated)
    }
}

impl Default for AuthTrace {
    fn default() -> Self {
        Self::start()
    }
}

/// The identity used for the next launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameCredential {
    /// Game profile name, or the Microsoft name when no profile exists.
    pub display_name: String,
    pub federated_account_name: String,
    pub game_profile_name: Option<String>,
    pub game_profile_id: Option<Uuid>,
    #[serde(skip_serializing)]
    pub game_access_token: String,
}

impl GameCredential {
    pub fn from_chain(federated_account_name: &str, outcome: ChainOutcome) -> Self {
        let (game_profile_name, game_profile_id) = match outcome.profile {
            ProfileStatus::Resolved(profile) => (Some(profile.name), Some(profile.id)),
            ProfileStatus::Unavailable(_) => (None, None),
        };

        Self {
            display_name: game_profile_name
                .clone()
                .unwrap_or_else(|| federated_account_name.to_string()),
            federated_account_name: federated_account_name.to_string(),
            game_profile_name,
            game_profile_id,
            game_access_token: outcome.game_access_token,
        }
    }

    /// A launch needs both a game token and a profile id.
    pub fn is_launchable(&self) -> bool {
        !self.game_access_token.trim().is_empty() && self.game_profile_id.is_some()
    }
}
