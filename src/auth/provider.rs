//! OAuth provider endpoint calls
//!
//! Authorization URL construction, code exchange, refresh and the device
//! authorization endpoints, all bound to one client registration.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::registration::ClientRegistration;
use super::token::{TokenEndpointResponse, TokenRecord};
use super::AuthResult;
use crate::config::{Config, ProviderEndpoints};
use crate::error::AuthError;

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Fallback verification page when the provider names none
const DEFAULT_VERIFICATION_URL: &str = "https://www.google.com/device";

/// Response from the device authorization endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    #[serde(default)]
    pub verification_url: Option<String>,
    #[serde(default)]
    pub verification_uri: Option<String>,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    pub expires_in: i64,
    #[serde(default)]
    pub interval: Option<u64>,
}

impl DeviceCodeResponse {
    /// Most specific verification URL the provider returned
    pub fn verification_target(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .or(self.verification_url.as_deref())
            .or(self.verification_uri.as_deref())
            .unwrap_or(DEFAULT_VERIFICATION_URL)
    }
}

/// OAuth client bound to a registration, redirect target and scope set
pub struct OAuthProvider {
    http_client: reqwest::Client,
    registration: ClientRegistration,
    endpoints: ProviderEndpoints,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl OAuthProvider {
    pub fn new(
        http_client: reqwest::Client,
        registration: ClientRegistration,
        config: &Config,
    ) -> Self {
        Self {
            http_client,
            registration,
            endpoints: config.endpoints.clone(),
            redirect_uri: config.redirect_uri(),
            scopes: config.scopes.clone(),
        }
    }

    /// HTTP client shared with downstream API calls
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    pub fn client_id(&self) -> &str {
        &self.registration.client_id
    }

    /// Authorization URL requesting offline access with forced consent
    pub fn authorization_url(&self) -> String {
        let scopes = self.scopes.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.endpoints.authorization_url,
            urlencoding::encode(&self.registration.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scopes)
        )
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &str, now: DateTime<Utc>) -> AuthResult<TokenRecord> {
        let params = [
            ("client_id", self.registration.client_id.as_str()),
            ("client_secret", self.registration.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let exchange_failed = |message: String| AuthError::CallbackExchangeFailed { message };

        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| exchange_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(exchange_failed(format!("{}: {}", status, text)));
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| exchange_failed(e.to_string()))?;

        TokenRecord::from_response(body, now)
    }

    /// Refresh an access token. The previous refresh token is kept if none is returned.
    pub async fn refresh(&self, refresh_token: &str, now: DateTime<Utc>) -> AuthResult<TokenRecord> {
        let params = [
            ("client_id", self.registration.client_id.as_str()),
            ("client_secret", self.registration.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let refresh_failed = |message: String| AuthError::TokenRefreshFailed { message };

        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| refresh_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(refresh_failed(format!("{}: {}", status, text)));
        }

        let body: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| refresh_failed(e.to_string()))?;

        let mut record = TokenRecord::from_response(body, now)?;

        if record.refresh_token.is_none() {
            record.refresh_token = Some(refresh_token.to_string());
        }

        Ok(record)
    }

    /// Start a device authorization session
    pub async fn request_device_code(&self) -> AuthResult<DeviceCodeResponse> {
        let scopes = self.scopes.join(" ");
        let params = [
            ("client_id", self.registration.client_id.as_str()),
            ("scope", scopes.as_str()),
        ];

        let request_failed = |message: String| AuthError::DeviceCodeRequestFailed { message };

        let response = self
            .http_client
            .post(&self.endpoints.device_code_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| request_failed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(request_failed(format!("{}: {}", status, text)));
        }

        response.json().await.map_err(|e| request_failed(e.to_string()))
    }

    /// Poll the token endpoint for a device code.
    ///
    /// Pending and rejection states come back as error bodies, so the body is
    /// decoded whatever the HTTP status.
    pub async fn poll_device_token(&self, device_code: &str) -> AuthResult<TokenEndpointResponse> {
        let params = [
            ("client_id", self.registration.client_id.as_str()),
            ("client_secret", self.registration.client_secret.as_str()),
            ("device_code", device_code),
            ("grant_type", DEVICE_GRANT_TYPE),
        ];

        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Provider {
                message: e.to_string(),
            })?;

        let status = response.status();
        response.json().await.map_err(|e| AuthError::Provider {
            message: format!("unreadable device token response ({}): {}", status, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OAuthProvider {
        let registration = ClientRegistration {
            client_id: "client id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uris: vec![],
        };
        OAuthProvider::new(
            reqwest::Client::new(),
            registration,
            &Config::with_dir("/tmp/gw"),
        )
    }

    #[test]
    fn test_authorization_url() {
        let url = provider().authorization_url();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client%20id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A4100%2Fcallback"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("gmail.modify"));
    }

    #[test]
    fn test_verification_target_preference() {
        let mut response: DeviceCodeResponse = serde_json::from_str(
            r#"{"device_code":"d","user_code":"ABCD-EFGH","expires_in":600}"#,
        )
        .unwrap();
        assert_eq!(response.verification_target(), "https://www.google.com/device");

        response.verification_url = Some("https://example.com/device".to_string());
        assert_eq!(response.verification_target(), "https://example.com/device");

        response.verification_uri_complete = Some("https://example.com/device?code=ABCD".to_string());
        assert_eq!(
            response.verification_target(),
            "https://example.com/device?code=ABCD"
        );
    }
}
