//! Token record, token endpoint responses and on-disk persistence

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuthResult;
use crate::error::AuthError;

/// Persisted credential proving delegated access (`token.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Access token
    pub access_token: String,

    /// Refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Space-separated granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Token type (usually "Bearer")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Absolute expiry (Unix milliseconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl TokenRecord {
    /// Build a record from a token endpoint response received at `now`
    pub fn from_response(response: TokenEndpointResponse, now: DateTime<Utc>) -> AuthResult<Self> {
        let access_token = response
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::Provider {
                message: "token response did not contain an access token".to_string(),
            })?;

        let expiry_date = match response.expires_in {
            Some(secs) => Some(
                secs.checked_mul(1000)
                    .and_then(|ms| now.timestamp_millis().checked_add(ms))
                    .filter(|ms| DateTime::from_timestamp_millis(*ms).is_some())
                    .ok_or_else(|| AuthError::Provider {
                        message: format!("token lifetime out of range: {}s", secs),
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            access_token,
            refresh_token: response.refresh_token,
            scope: response.scope,
            token_type: response.token_type,
            expiry_date,
        })
    }

    /// Expiry as an instant, if known
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expiry_date.and_then(DateTime::from_timestamp_millis)
    }

    /// Whether the token expires before `now + window`. Unknown expiry never expires.
    pub fn expires_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.expires_at().is_some_and(|at| at <= now + window)
    }

    /// Granted scopes as a list
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// Body returned by the token endpoint, for success and error alike
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenEndpointResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Reads and writes the token record file
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record. Missing or unreadable files count as absent.
    pub async fn load(&self) -> Option<TokenRecord> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Could not read token file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring malformed token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrite the token file, creating its directory if needed
    pub async fn save(&self, record: &TokenRecord) -> AuthResult<()> {
        let storage_err = |e: std::io::Error| AuthError::TokenStorage {
            path: self.path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }

        let content = serde_json::to_string_pretty(record).map_err(|e| AuthError::TokenStorage {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        // Write beside the target then rename so readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(storage_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(storage_err)?;

        tracing::debug!("Token saved to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TokenRecord {
        TokenRecord {
            access_token: "ya29.access".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            scope: Some(
                "https://www.googleapis.com/auth/drive https://www.googleapis.com/auth/calendar"
                    .to_string(),
            ),
            token_type: Some("Bearer".to_string()),
            expiry_date: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn test_from_response_computes_expiry() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let response = TokenEndpointResponse {
            access_token: Some("token".to_string()),
            expires_in: Some(3599),
            ..Default::default()
        };

        let record = TokenRecord::from_response(response, now).unwrap();
        assert_eq!(record.expiry_date, Some(1_700_003_599_000));
        assert_eq!(record.expires_at(), Some(now + chrono::Duration::seconds(3599)));
    }

    #[test]
    fn test_from_response_requires_access_token() {
        let response = TokenEndpointResponse {
            error: Some("authorization_pending".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            TokenRecord::from_response(response, Utc::now()),
            Err(AuthError::Provider { .. })
        ));
    }

    #[test]
    fn test_from_response_rejects_out_of_range_lifetime() {
        let response = TokenEndpointResponse {
            access_token: Some("token".to_string()),
            expires_in: Some(i64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            TokenRecord::from_response(response, Utc::now()),
            Err(AuthError::Provider { .. })
        ));
    }

    #[test]
    fn test_expires_within() {
        let record = sample();
        let expiry = record.expires_at().unwrap();

        assert!(record.expires_within(expiry - chrono::Duration::seconds(60), chrono::Duration::minutes(5)));
        assert!(!record.expires_within(expiry - chrono::Duration::hours(1), chrono::Duration::minutes(5)));

        let no_expiry = TokenRecord {
            expiry_date: None,
            ..sample()
        };
        assert!(!no_expiry.expires_within(Utc::now(), chrono::Duration::minutes(5)));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let record = TokenRecord {
            access_token: "only".to_string(),
            refresh_token: None,
            scope: None,
            token_type: None,
            expiry_date: None,
        };
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"access_token":"only"}"#);
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));

        assert!(store.load().await.is_none());

        let record = sample();
        store.save(&record).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.scopes().len(), 2);
    }

    #[tokio::test]
    async fn test_store_ignores_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(TokenStore::new(path).load().await.is_none());
    }
}
