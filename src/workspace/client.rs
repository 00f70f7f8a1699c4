//! Authenticated REST client for the Google Workspace APIs

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use crate::auth::AuthenticatedClient;
use crate::config::ApiEndpoints;
use crate::error::{ApiError, Result};

use super::{calendar, docs, drive, gmail, people, sheets, slides};

/// Query string pairs
pub type Query<'a> = &'a [(&'a str, String)];

/// Google Workspace API client
pub struct WorkspaceClient {
    /// OAuth session
    auth: Arc<AuthenticatedClient>,

    /// API base URLs
    apis: ApiEndpoints,
}

impl WorkspaceClient {
    /// Create a new Workspace client
    pub fn new(auth: Arc<AuthenticatedClient>, apis: ApiEndpoints) -> Self {
        Self { auth, apis }
    }

    pub fn apis(&self) -> &ApiEndpoints {
        &self.apis
    }

    pub fn gmail(&self) -> gmail::Gmail<'_> {
        gmail::Gmail::new(self)
    }

    pub fn calendar(&self) -> calendar::Calendar<'_> {
        calendar::Calendar::new(self)
    }

    pub fn drive(&self) -> drive::Drive<'_> {
        drive::Drive::new(self)
    }

    pub fn docs(&self) -> docs::Docs<'_> {
        docs::Docs::new(self)
    }

    pub fn sheets(&self) -> sheets::Sheets<'_> {
        sheets::Sheets::new(self)
    }

    pub fn slides(&self) -> slides::Slides<'_> {
        slides::Slides::new(self)
    }

    pub fn people(&self) -> people::People<'_> {
        people::People::new(self)
    }

    async fn request(&self, method: Method, url: &str, query: Query<'_>) -> Result<RequestBuilder> {
        let token = self.auth.access_token().await?;

        Ok(self
            .auth
            .http_client()
            .request(method, url)
            .bearer_auth(token)
            .query(query))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        tracing::debug!("Request to {} failed ({}): {}", url, status, text);

        if status.as_u16() == 404 {
            return Err(ApiError::NotFound {
                resource: url.to_string(),
            }
            .into());
        }

        Err(ApiError::RequestFailed {
            status: status.as_u16(),
            message: api_error_message(&text),
        }
        .into())
    }

    async fn json_response(response: Response) -> Result<Value> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// GET a JSON resource
    pub async fn get(&self, url: &str, query: Query<'_>) -> Result<Value> {
        let request = self.request(Method::GET, url, query).await?;
        Self::json_response(self.send(request, url).await?).await
    }

    /// GET a resource as text (media downloads and exports)
    pub async fn get_text(&self, url: &str, query: Query<'_>) -> Result<String> {
        let request = self.request(Method::GET, url, query).await?;
        Ok(self.send(request, url).await?.text().await?)
    }

    /// Send a JSON body with `method`
    pub async fn send_json(
        &self,
        method: Method,
        url: &str,
        query: Query<'_>,
        body: &Value,
    ) -> Result<Value> {
        let request = self.request(method, url, query).await?.json(body);
        Self::json_response(self.send(request, url).await?).await
    }

    pub async fn post(&self, url: &str, query: Query<'_>, body: &Value) -> Result<Value> {
        self.send_json(Method::POST, url, query, body).await
    }

    pub async fn put(&self, url: &str, query: Query<'_>, body: &Value) -> Result<Value> {
        self.send_json(Method::PUT, url, query, body).await
    }

    pub async fn patch(&self, url: &str, query: Query<'_>, body: &Value) -> Result<Value> {
        self.send_json(Method::PATCH, url, query, body).await
    }

    /// POST with no body
    pub async fn post_empty(&self, url: &str, query: Query<'_>) -> Result<Value> {
        let request = self
            .request(Method::POST, url, query)
            .await?
            .header(reqwest::header::CONTENT_LENGTH, "0");
        Self::json_response(self.send(request, url).await?).await
    }

    pub async fn delete(&self, url: &str, query: Query<'_>) -> Result<()> {
        let request = self.request(Method::DELETE, url, query).await?;
        self.send(request, url).await?;
        Ok(())
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// Percent-encode a path segment
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Client with a never-expiring token whose APIs all live under `root`
#[cfg(test)]
pub(crate) fn test_client(root: &str) -> WorkspaceClient {
    use crate::auth::provider::OAuthProvider;
    use crate::auth::{ClientRegistration, SystemClock, TokenRecord, TokenStore};
    use crate::config::Config;

    let config = Config::with_dir(std::env::temp_dir().join("google-workspace-mcp-client-test"));
    let registration = ClientRegistration {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uris: vec![],
    };
    let provider = OAuthProvider::new(reqwest::Client::new(), registration, &config);
    let token = TokenRecord {
        access_token: "access".to_string(),
        refresh_token: None,
        scope: None,
        token_type: None,
        expiry_date: None,
    };
    let auth = AuthenticatedClient::new(
        Arc::new(provider),
        TokenStore::new(config.token_path.clone()),
        Arc::new(SystemClock),
        token,
    );

    WorkspaceClient::new(Arc::new(auth), ApiEndpoints::with_root(root))
}
