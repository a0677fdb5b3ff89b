// ─── Auth session ───
// Owns the current game credential. Silent and interactive logins share one
// gate so at most one attempt runs at a time, and only a fully successful
// relay replaces the credential.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::core::error::{AuthError, LauncherError, LauncherResult};

use super::callback::{CallbackListener, CALLBACK_PATH, CALLBACK_PORT};
use super::endpoints::AuthEndpoints;
use super::msa::{IdentityClient, MS_CLIENT_ID};
use super::token_cache::{CachedAccount, TokenCache};
use super::xbox::XboxAuthChain;
use super::{AuthStage, AuthTrace, GameCredential};

pub struct AuthConfig {
    pub client_id: String,
    pub endpoints: AuthEndpoints,
    pub callback_addr: SocketAddr,
    pub callback_path: String,
    pub token_cache_path: PathBuf,
    /// Applied to every relay request.
    pub request_timeout: Duration,
    /// How long an interactive login waits for the browser callback.
    pub interactive_timeout: Duration,
}

impl AuthConfig {
    pub fn new(token_cache_path: PathBuf) -> Self {
        Self {
            client_id: MS_CLIENT_ID.to_string(),
            endpoints: AuthEndpoints::default(),
            callback_addr: SocketAddr::from(([127, 0, 0, 1], CALLBACK_PORT)),
            callback_path: CALLBACK_PATH.to_string(),
            token_cache_path,
            request_timeout: Duration::from_secs(30),
            interactive_timeout: Duration::from_secs(300),
        }
    }
}

/// Shows the authorization page to the user.
pub trait AuthorizationOpener: Send + Sync {
    fn open(&self, url: &str) -> LauncherResult<()>;

    /// Called once when the attempt ends, whatever the outcome.
    fn close(&self) {}
}

/// Opens the page in the default browser.
pub struct SystemBrowser;

impl AuthorizationOpener for SystemBrowser {
    fn open(&self, url: &str) -> LauncherResult<()> {
        open::that(url).map_err(|e| LauncherError::Other(format!("Cannot open the browser: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SilentLogin {
    /// No cached account: nothing was attempted.
    NoPriorSession,
    SignedIn(GameCredential),
    /// A cached account exists but could not be turned into a credential.
    Unavailable(String),
}

pub struct AuthService {
    identity: IdentityClient,
    xbox: XboxAuthChain,
    callback_addr: SocketAddr,
    callback_path: String,
    token_cache_path: PathBuf,
    interactive_timeout: Duration,
    current: RwLock<Option<GameCredential>>,
    last_trace: Mutex<AuthTrace>,
    login_gate: Mutex<()>,
}

impl AuthService {
    pub fn new(http: Client, config: AuthConfig) -> Self {
        Self {
            identity: IdentityClient::new(
                http.clone(),
                config.endpoints.clone(),
                config.client_id,
                config.request_timeout,
            ),
            xbox: XboxAuthChain::new(http, config.endpoints, config.request_timeout),
            callback_addr: config.callback_addr,
            callback_path: config.callback_path,
            token_cache_path: config.token_cache_path,
            interactive_timeout: config.interactive_timeout,
            current: RwLock::new(None),
            last_trace: Mutex::new(AuthTrace::start()),
            login_gate: Mutex::new(()),
        }
    }

    pub async fn current(&self) -> Option<GameCredential> {
        self.current.read().await.clone()
    }

    /// Stages reached by the most recent login attempt.
    pub async fn last_trace(&self) -> AuthTrace {
        self.last_trace.lock().await.clone()
    }

    /// Refreshes the first cached account without user interaction.
    pub async fn login_silent(&self) -> SilentLogin {
        let _gate = self.login_gate.lock().await;
        let mut trace = AuthTrace::start();
        let outcome = self.silent_attempt(&mut trace).await;
        *self.last_trace.lock().await = trace;

        match &outcome {
            SilentLogin::NoPriorSession => info!("No cached Microsoft account"),
            SilentLogin::SignedIn(credential) => {
                info!("Silent sign-in as {}", credential.display_name)
            }
            SilentLogin::Unavailable(reason) => warn!("Silent sign-in unavailable: {}", reason),
        }
        outcome
    }

    /// Browser-based login through the loopback callback.
    pub async fn login_interactive(
        &self,
        opener: &dyn AuthorizationOpener,
    ) -> LauncherResult<GameCredential> {
        let _gate = self.login_gate.lock().await;
        let mut trace = AuthTrace::start();
        let result = self.interactive_attempt(opener, &mut trace).await;
        *self.last_trace.lock().await = trace;

        if let Err(err) = &result {
            error!("Interactive sign-in failed: {}", err);
        }
        result
    }

    /// The current credential, or a new interactive login if there is none.
    pub async fn sign_in(&self, opener: &dyn AuthorizationOpener) -> LauncherResult<GameCredential> {
        if let Some(credential) = self.current().await {
            return Ok(credential);
        }
        self.login_interactive(opener).await
    }

    async fn silent_attempt(&self, trace: &mut AuthTrace) -> SilentLogin {
        let mut cache = match TokenCache::load(&self.token_cache_path).await {
            Ok(cache) => cache,
            Err(e) => return SilentLogin::Unavailable(format!("token cache unreadable: {e}")),
        };
        let Some(account) = cache.accounts().first().cloned() else {
            return SilentLogin::NoPriorSession;
        };

        let account = if account.access_token_usable(Utc::now()) {
            account
        } else {
            let Some(refresh_token) = account.refresh_token.as_deref() else {
                return SilentLogin::Unavailable("cached account has no refresh token".into());
            };
            match self.identity.refresh(refresh_token).await {
                Ok(token) => {
                    let updated = CachedAccount::from_token(&token, Some(&account));
                    cache.upsert(updated.clone());
                    persist(&mut cache).await;
                    updated
                }
                Err(e) => return SilentLogin::Unavailable(e.to_string()),
            }
        };
        trace.advance(AuthStage::FederatedTokenObtained);

        match self
            .complete(&account.access_token, account.display_name(), trace)
            .await
        {
            Ok(credential) => SilentLogin::SignedIn(credential),
            Err(e) => SilentLogin::Unavailable(e.to_string()),
        }
    }

    async fn interactive_attempt(
        &self,
        opener: &dyn AuthorizationOpener,
        trace: &mut AuthTrace,
    ) -> LauncherResult<GameCredential> {
        let listener = CallbackListener::bind(self.callback_addr, &self.callback_path).await?;
        let mut session = LoginSession::new(listener, opener);
        let redirect_uri = session.listener.redirect_uri();

        let url = self.identity.authorization_url(&redirect_uri)?;
        opener.open(&url)?;
        info!("Waiting for the sign-in callback on {}", redirect_uri);

        let code = tokio::time::timeout(
            self.interactive_timeout,
            session.listener.wait_for_code(),
        )
        .await
        .unwrap_or(Err(AuthError::TimedOut));
        session.finish();
        let code = code?;

        let token = self.identity.exchange_code(&code, &redirect_uri).await?;
        trace.advance(AuthStage::FederatedTokenObtained);

        let account = CachedAccount::from_token(&token, None);
        let mut cache = match TokenCache::load(&self.token_cache_path).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!("Token cache unreadable, not saving this account: {}", e);
                None
            }
        };
        if let Some(cache) = cache.as_mut() {
            cache.upsert(account.clone());
            persist(cache).await;
        }

        self.complete(&token.access_token, account.display_name(), trace)
            .await
            .map_err(LauncherError::from)
    }

    /// Runs the shared relay and publishes the result.
    async fn complete(
        &self,
        federated_token: &str,
        account_name: &str,
        trace: &mut AuthTrace,
    ) -> Result<GameCredential, AuthError> {
        let outcome = self.xbox.run(federated_token, trace).await?;
        let credential = GameCredential::from_chain(account_name, outcome);
        *self.current.write().await = Some(credential.clone());
        Ok(credential)
    }
}

async fn persist(cache: &mut TokenCache) {
    if let Err(e) = cache.save().await {
        warn!("Failed to save the token cache: {}", e);
    }
}

/// Tears down the callback listener and the opener exactly once.
struct LoginSession<'a> {
    listener: CallbackListener,
    opener: &'a dyn AuthorizationOpener,
    finished: bool,
}

impl<'a> LoginSession<'a> {
    fn new(listener: CallbackListener, opener: &'a dyn AuthorizationOpener) -> Self {
        Self {
            listener,
            opener,
            finished: false,
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.listener.shutdown();
        self.opener.close();
    }
}

impl Drop for LoginSession<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}
