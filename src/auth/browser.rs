//! Loopback browser-redirect authorization flow
//!
//! Serves a single `/callback` request on a fixed loopback port, exchanges
//! the authorization code, then tears the listener down.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::sync::{oneshot, Mutex};

use super::clock::Clock;
use super::provider::OAuthProvider;
use super::token::{TokenRecord, TokenStore};
use super::AuthResult;
use crate::config::CALLBACK_PATH;
use crate::error::AuthError;

/// How long to wait for the listener to drain after the flow resolves
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const SUCCESS_PAGE: &str =
    "<html><body><h1>Authentication successful!</h1><p>You can close this window.</p></body></html>";
const NO_CODE_PAGE: &str =
    "<html><body><h1>Authentication failed</h1><p>No authorization code received.</p></body></html>";
const ERROR_PAGE: &str =
    "<html><body><h1>Authentication error</h1><p>Check the server log for details.</p></body></html>";
const ALREADY_HANDLED_PAGE: &str =
    "<html><body><h1>Authentication already completed</h1></body></html>";

/// Browser flow settings
#[derive(Debug, Clone, Copy)]
pub struct BrowserFlowOptions {
    pub port: u16,
    pub timeout: Duration,
    pub open_browser: bool,
}

struct CallbackState {
    provider: Arc<OAuthProvider>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    outcome: Mutex<Option<oneshot::Sender<AuthResult<TokenRecord>>>>,
}

impl CallbackState {
    async fn complete(&self, code: &str) -> AuthResult<TokenRecord> {
        let record = self.provider.exchange_code(code, self.clock.now()).await?;
        self.store
            .save(&record)
            .await
            .map_err(|e| AuthError::CallbackExchangeFailed {
                message: e.to_string(),
            })?;
        Ok(record)
    }
}

async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    // Only the first callback resolves the flow.
    let Some(outcome) = state.outcome.lock().await.take() else {
        return (StatusCode::GONE, Html(ALREADY_HANDLED_PAGE));
    };

    let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
        if let Some(error) = params.get("error") {
            tracing::warn!("Authorization callback returned error: {}", error);
        }
        let _ = outcome.send(Err(AuthError::NoAuthorizationCode));
        return (StatusCode::BAD_REQUEST, Html(NO_CODE_PAGE));
    };

    eprintln!("Received authorization code, exchanging for tokens...");

    match state.complete(code).await {
        Ok(record) => {
            let _ = outcome.send(Ok(record));
            (StatusCode::OK, Html(SUCCESS_PAGE))
        }
        Err(e) => {
            tracing::error!("Authorization code exchange failed: {}", e);
            let _ = outcome.send(Err(e));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(ERROR_PAGE))
        }
    }
}

/// Run the browser flow and persist the resulting token
pub async fn authorize(
    provider: Arc<OAuthProvider>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    options: BrowserFlowOptions,
) -> AuthResult<TokenRecord> {
    let addr = SocketAddr::from(([127, 0, 0, 1], options.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AddrInUse => AuthError::PortInUse { port: options.port },
            _ => AuthError::Listener {
                message: e.to_string(),
            },
        })?;

    let auth_url = provider.authorization_url();

    let (outcome_tx, outcome_rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let state = Arc::new(CallbackState {
        provider,
        store,
        clock,
        outcome: Mutex::new(Some(outcome_tx)),
    });

    let app = Router::new()
        .route(CALLBACK_PATH, get(handle_callback))
        .with_state(state);

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    eprintln!("\nOpening browser for authentication...");
    eprintln!("If the browser doesn't open, visit:");
    eprintln!("{}\n", auth_url);

    if options.open_browser {
        if let Err(e) = open::that(&auth_url) {
            eprintln!("Could not open browser automatically: {}", e);
            eprintln!("Please open the URL manually.");
        }
    }

    tracing::info!("Waiting for authentication callback on port {}...", options.port);

    let outcome = tokio::select! {
        received = outcome_rx => received.unwrap_or_else(|_| Err(AuthError::Listener {
            message: "callback handler dropped without a result".to_string(),
        })),
        _ = tokio::time::sleep(options.timeout) => Err(AuthError::BrowserFlowTimedOut),
    };

    // Release the port before reporting, whatever the outcome.
    let _ = shutdown_tx.send(());
    match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::warn!("Callback listener exited with error: {}", e),
        Ok(Err(e)) => tracing::warn!("Callback listener task failed: {}", e),
        Err(_) => {
            tracing::warn!("Callback listener did not drain in time, aborting");
            server.abort();
            let _ = server.await;
        }
    }

    outcome
}
