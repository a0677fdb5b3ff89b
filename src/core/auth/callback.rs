// ─── Loopback callback listener ───
// Receives the browser redirect carrying the authorization code. Lives for
// exactly one interactive login.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::core::error::{AuthError, LauncherError, LauncherResult};

use super::AuthStage;

pub const CALLBACK_PATH: &str = "/auth/callback";
pub const CALLBACK_PORT: u16 = 19191;

const SUCCESS_PAGE: &str = "<html><body style=\"font-family:sans-serif\">\
<h2>Login successful</h2><p>You can close this window and return to the launcher.</p>\
</body></html>";

type CodeResult = Result<String, AuthError>;
type CodeSlot = Arc<Mutex<Option<oneshot::Sender<CodeResult>>>>;

/// Parameters of the redirect. Repeated keys keep their first value.
#[derive(Debug, Default)]
struct CallbackQuery {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackQuery {
    /// Lenient parse: undecodable bytes become U+FFFD instead of failing.
    fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let slot = match &*key {
                "code" if value.is_empty() => continue,
                "code" => &mut query.code,
                "error" => &mut query.error,
                "error_description" => &mut query.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }
}

pub struct CallbackListener {
    local_addr: SocketAddr,
    path: String,
    code_rx: Option<oneshot::Receiver<CodeResult>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl CallbackListener {
    /// Binds the listener and starts serving in the background.
    pub async fn bind(addr: SocketAddr, path: &str) -> LauncherResult<Self> {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            LauncherError::Other(format!("Cannot listen for the sign-in callback on {addr}: {e}"))
        })?;
        let local_addr = listener.local_addr()?;

        let (code_tx, code_rx) = oneshot::channel();
        let slot: CodeSlot = Arc::new(Mutex::new(Some(code_tx)));
        let app = Router::new()
            .route(path, get(handle_callback))
            .fallback(not_found)
            .with_state(slot);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                warn!("Callback listener stopped with an error: {}", e);
            }
        });

        info!("Listening for the sign-in callback on {}", local_addr);
        Ok(Self {
            local_addr,
            path: path.to_string(),
            code_rx: Some(code_rx),
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{}", self.local_addr.port(), self.path)
    }

    /// Resolves with the first callback that hits the listener.
    pub async fn wait_for_code(&mut self) -> CodeResult {
        let Some(rx) = self.code_rx.take() else {
            return Err(closed());
        };
        rx.await.unwrap_or_else(|_| Err(closed()))
    }

    /// Stops accepting connections. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            debug!("Callback listener on {} closed", self.local_addr);
        }
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn closed() -> AuthError {
    AuthError::ExchangeFailed {
        stage: AuthStage::FederatedTokenObtained,
        reason: "callback listener closed before a code arrived".into(),
    }
}

async fn handle_callback(
    State(slot): State<CodeSlot>,
    RawQuery(raw): RawQuery,
) -> Response {
    let query = CallbackQuery::parse(raw.as_deref());
    let (result, response) = match query.code {
        Some(code) => (Ok(code), (StatusCode::OK, Html(SUCCESS_PAGE)).into_response()),
        None => {
            if let Some(error) = &query.error {
                warn!(
                    "Sign-in callback without code: {} {}",
                    error,
                    query.error_description.as_deref().unwrap_or_default()
                );
            }
            (
                Err(AuthError::MissingCode),
                (StatusCode::BAD_REQUEST, "Missing code").into_response(),
            )
        }
    };

    let sender = slot.lock().ok().and_then(|mut guard| guard.take());
    match sender {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => debug!("Ignoring repeated sign-in callback"),
    }
    response
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}
