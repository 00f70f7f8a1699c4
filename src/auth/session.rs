//! Authenticated handle given to downstream API clients

use std::sync::Arc;

use tokio::sync::RwLock;

use super::clock::Clock;
use super::provider::OAuthProvider;
use super::token::{TokenRecord, TokenStore};
use crate::error::{AuthError, Result};

/// Refresh when the access token expires within this window
const REFRESH_AHEAD_SECS: i64 = 300;

/// Attaches valid bearer credentials to outbound Workspace API calls
pub struct AuthenticatedClient {
    provider: Arc<OAuthProvider>,
    store: TokenStore,
    clock: Arc<dyn Clock>,
    token: RwLock<TokenRecord>,
}

impl AuthenticatedClient {
    pub(crate) fn new(
        provider: Arc<OAuthProvider>,
        store: TokenStore,
        clock: Arc<dyn Clock>,
        token: TokenRecord,
    ) -> Self {
        Self {
            provider,
            store,
            clock,
            token: RwLock::new(token),
        }
    }

    /// HTTP client for API requests
    pub fn http_client(&self) -> &reqwest::Client {
        self.provider.http_client()
    }

    /// Snapshot of the current token record
    pub async fn token(&self) -> TokenRecord {
        self.token.read().await.clone()
    }

    fn needs_refresh(&self, token: &TokenRecord) -> bool {
        token.expires_within(
            self.clock.now(),
            chrono::Duration::seconds(REFRESH_AHEAD_SECS),
        )
    }

    /// Get a valid access token, refreshing if necessary
    pub async fn access_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if !self.needs_refresh(&token) {
                return Ok(token.access_token.clone());
            }
        }

        let mut token = self.token.write().await;

        // Another caller may have refreshed while we waited for the lock.
        if !self.needs_refresh(&token) {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::TokenRefreshFailed {
                message: "No refresh token available".to_string(),
            })?;

        tracing::info!("Access token expiring, refreshing");
        let refreshed = self
            .provider
            .refresh(&refresh_token, self.clock.now())
            .await?;
        self.store.save(&refreshed).await?;

        *token = refreshed;
        Ok(token.access_token.clone())
    }
}
