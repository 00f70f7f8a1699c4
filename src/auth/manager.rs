//! Credential & session manager
//!
//! Loads the client registration, tries a silent refresh of the persisted
//! token, and otherwise drives the configured interactive flow.

use std::sync::Arc;

use super::browser::{self, BrowserFlowOptions};
use super::clock::{Clock, SystemClock};
use super::device;
use super::provider::OAuthProvider;
use super::registration::{setup_instructions, ClientRegistration};
use super::session::AuthenticatedClient;
use super::token::{TokenRecord, TokenStore};
use super::AuthResult;
use crate::config::{AuthFlow, Config};
use crate::error::{AuthError, Result};

/// Produces an authenticated handle, once per process
pub struct SessionManager {
    config: Config,
    clock: Arc<dyn Clock>,
    http_client: reqwest::Client,
}

impl SessionManager {
    /// Create a manager on the system clock
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a manager with a custom time source
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            http_client: reqwest::Client::new(),
        }
    }

    /// Acquire an authenticated session, running an interactive flow if needed
    pub async fn acquire_session(&self) -> Result<AuthenticatedClient> {
        let registration = match ClientRegistration::load(&self.config.credentials_path) {
            Ok(registration) => registration,
            Err(e) => {
                if matches!(e, AuthError::MissingRegistration { .. }) {
                    self.ensure_config_dir().await;
                }
                if let Some(help) = setup_instructions(&e, &self.config.credentials_path) {
                    eprintln!("{}", help);
                }
                return Err(e.into());
            }
        };

        let provider = Arc::new(OAuthProvider::new(
            self.http_client.clone(),
            registration,
            &self.config,
        ));
        let store = TokenStore::new(&self.config.token_path);

        if let Some(record) = store.load().await {
            if let Some(record) = self.reuse_persisted(&provider, &store, record).await {
                return Ok(self.handle(provider, store, record));
            }
        }

        let record = self.authorize_interactive(&provider, &store).await?;
        tracing::info!("Authorization complete, token saved to {}", store.path().display());

        Ok(self.handle(provider, store, record))
    }

    /// Create the configuration directory so the operator has somewhere to put credentials
    async fn ensure_config_dir(&self) {
        if let Err(e) = tokio::fs::create_dir_all(&self.config.config_dir).await {
            tracing::warn!(
                "Could not create config directory {}: {}",
                self.config.config_dir.display(),
                e
            );
        }
    }

    /// Silent path: refresh a persisted token. `None` means interactive auth is required.
    async fn reuse_persisted(
        &self,
        provider: &OAuthProvider,
        store: &TokenStore,
        record: TokenRecord,
    ) -> Option<TokenRecord> {
        let Some(refresh_token) = record.refresh_token.as_deref() else {
            if record.expires_within(self.clock.now(), chrono::Duration::zero()) {
                tracing::info!("Stored token expired and cannot be refreshed, re-authenticating");
                return None;
            }
            return Some(record);
        };

        let refreshed = match provider.refresh(refresh_token, self.clock.now()).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::warn!("{}", e);
                eprintln!("Token refresh failed, re-authenticating...");
                return None;
            }
        };

        if let Err(e) = store.save(&refreshed).await {
            tracing::warn!("{}", e);
            return None;
        }

        tracing::info!("Refreshed stored token");
        Some(refreshed)
    }

    async fn authorize_interactive(
        &self,
        provider: &Arc<OAuthProvider>,
        store: &TokenStore,
    ) -> AuthResult<TokenRecord> {
        tracing::info!("Starting interactive authorization (flow: {})", self.config.auth_flow);

        match self.config.auth_flow {
            AuthFlow::Device => device::authorize(provider, store, self.clock.as_ref()).await,
            AuthFlow::Browser => self.authorize_browser(provider, store).await,
            AuthFlow::Auto => match self.authorize_browser(provider, store).await {
                Ok(record) => Ok(record),
                Err(browser_err) => {
                    tracing::warn!("Browser authorization failed: {}", browser_err);
                    eprintln!("Browser auth failed, falling back to device flow...");

                    device::authorize(provider, store, self.clock.as_ref())
                        .await
                        .map_err(|device_err| AuthError::AllFlowsFailed {
                            browser: Box::new(browser_err),
                            device: Box::new(device_err),
                        })
                }
            },
        }
    }

    async fn authorize_browser(
        &self,
        provider: &Arc<OAuthProvider>,
        store: &TokenStore,
    ) -> AuthResult<TokenRecord> {
        let options = BrowserFlowOptions {
            port: self.config.callback_port,
            timeout: self.config.browser_timeout,
            open_browser: self.config.open_browser,
        };

        browser::authorize(provider.clone(), store.clone(), self.clock.clone(), options).await
    }

    fn handle(
        &self,
        provider: Arc<OAuthProvider>,
        store: TokenStore,
        record: TokenRecord,
    ) -> AuthenticatedClient {
        tracing::debug!(
            "Session for client {} with scopes {:?}",
            provider.client_id(),
            record.scopes()
        );
        AuthenticatedClient::new(provider, store, self.clock.clone(), record)
    }
}
