//! Device-code authorization flow
//!
//! The operator authorizes on any browser using a short code while this
//! process polls the token endpoint until the grant resolves or the session
//! expires.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::clock::Clock;
use super::provider::{DeviceCodeResponse, OAuthProvider};
use super::token::{TokenEndpointResponse, TokenRecord, TokenStore};
use super::AuthResult;
use crate::error::AuthError;

/// Poll interval when the provider does not declare one
const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Added to the interval on every `slow_down`
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// An in-progress device authorization
#[derive(Debug, Clone)]
pub struct DeviceSession {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub interval: Duration,
    pub expires_at: DateTime<Utc>,
}

impl DeviceSession {
    pub fn from_response(response: &DeviceCodeResponse, now: DateTime<Utc>) -> AuthResult<Self> {
        let expires_at = chrono::Duration::try_seconds(response.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::Provider {
                message: format!("device code lifetime out of range: {}s", response.expires_in),
            })?;

        Ok(Self {
            device_code: response.device_code.clone(),
            user_code: response.user_code.clone(),
            verification_url: response.verification_target().to_string(),
            interval: response
                .interval
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_INTERVAL),
            expires_at,
        })
    }

    /// Time left before `expires_at`, zero once it has passed
    fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Outcome of one token endpoint poll
#[derive(Debug)]
pub enum DevicePoll {
    Granted(TokenEndpointResponse),
    Pending,
    SlowDown,
    Denied {
        code: String,
        description: Option<String>,
    },
}

impl From<TokenEndpointResponse> for DevicePoll {
    fn from(response: TokenEndpointResponse) -> Self {
        if response.access_token.as_deref().is_some_and(|t| !t.is_empty()) {
            return DevicePoll::Granted(response);
        }

        match response.error.as_deref() {
            None | Some("authorization_pending") => DevicePoll::Pending,
            Some("slow_down") => DevicePoll::SlowDown,
            Some(code) => DevicePoll::Denied {
                code: code.to_string(),
                description: response.error_description.clone(),
            },
        }
    }
}

/// Run the device flow to completion and persist the granted token
pub async fn authorize(
    provider: &OAuthProvider,
    store: &TokenStore,
    clock: &dyn Clock,
) -> AuthResult<TokenRecord> {
    let response = provider.request_device_code().await?;
    let session = DeviceSession::from_response(&response, clock.now())?;

    eprintln!("\n=== Google Workspace Device Authentication ===");
    eprintln!("Open this URL in any browser and complete sign-in:");
    eprintln!("{}", session.verification_url);
    eprintln!("If prompted, enter code: {}", session.user_code);
    eprintln!("Waiting for authorization...");

    let mut interval = session.interval;
    let mut pending_polls = 0u32;

    while clock.now() < session.expires_at {
        clock.sleep(interval.min(session.remaining(clock.now()))).await;

        if clock.now() >= session.expires_at {
            break;
        }

        let response = provider.poll_device_token(&session.device_code).await?;

        match DevicePoll::from(response) {
            DevicePoll::Granted(response) => {
                let record = TokenRecord::from_response(response, clock.now())?;
                store.save(&record).await?;
                tracing::info!(
                    "Device authorization granted after {} pending poll(s)",
                    pending_polls
                );
                return Ok(record);
            }
            DevicePoll::Pending => {
                pending_polls += 1;
                tracing::debug!("Device authorization pending");
            }
            DevicePoll::SlowDown => {
                interval += SLOW_DOWN_STEP;
                tracing::debug!("Provider asked to slow down, polling every {:?}", interval);
            }
            DevicePoll::Denied { code, description } => {
                tracing::warn!("Device authorization rejected: {}", code);
                return Err(AuthError::DeviceFlowRejected { code, description });
            }
        }
    }

    Err(AuthError::DeviceFlowTimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> TokenEndpointResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_poll_classification() {
        assert!(matches!(
            DevicePoll::from(response(r#"{"access_token":"t","expires_in":3600}"#)),
            DevicePoll::Granted(_)
        ));
        assert!(matches!(
            DevicePoll::from(response(r#"{"error":"authorization_pending"}"#)),
            DevicePoll::Pending
        ));
        assert!(matches!(DevicePoll::from(response("{}")), DevicePoll::Pending));
        assert!(matches!(
            DevicePoll::from(response(r#"{"error":"slow_down"}"#)),
            DevicePoll::SlowDown
        ));

        match DevicePoll::from(response(
            r#"{"error":"access_denied","error_description":"Forbidden"}"#,
        )) {
            DevicePoll::Denied { code, description } => {
                assert_eq!(code, "access_denied");
                assert_eq!(description.as_deref(), Some("Forbidden"));
            }
            other => panic!("unexpected poll outcome: {:?}", other),
        }
    }

    #[test]
    fn test_session_defaults_interval() {
        let now = Utc::now();
        let device: DeviceCodeResponse = serde_json::from_str(
            r#"{"device_code":"d","user_code":"ABCD-EFGH","verification_url":"https://www.google.com/device","expires_in":600}"#,
        )
        .unwrap();

        let session = DeviceSession::from_response(&device, now).unwrap();
        assert_eq!(session.interval, Duration::from_secs(5));
        assert_eq!(session.expires_at, now + chrono::Duration::minutes(10));
        assert_eq!(session.user_code, "ABCD-EFGH");
        assert_eq!(session.remaining(now), Duration::from_secs(600));
        assert_eq!(
            session.remaining(now + chrono::Duration::minutes(11)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_session_rejects_out_of_range_lifetime() {
        let device: DeviceCodeResponse = serde_json::from_str(&format!(
            r#"{{"device_code":"d","user_code":"ABCD-EFGH","expires_in":{}}}"#,
            i64::MAX
        ))
        .unwrap();

        assert!(matches!(
            DeviceSession::from_response(&device, Utc::now()),
            Err(AuthError::Provider { .. })
        ));
    }
}
