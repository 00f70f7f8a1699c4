//! Error types for the Google Workspace MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Main error type for the Google Workspace MCP Server
#[derive(Error, Debug)]
pub enum WorkspaceMcpError {
    /// OAuth authentication errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Google Workspace API errors
    #[error("Workspace API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// OAuth authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Client registration not found: {path}")]
    MissingRegistration { path: String },

    #[error("Invalid client registration: {message}")]
    InvalidRegistration { message: String },

    #[error("No authorization code received")]
    NoAuthorizationCode,

    #[error("Authorization code exchange failed: {message}")]
    CallbackExchangeFailed { message: String },

    #[error("Timed out waiting for the browser callback")]
    BrowserFlowTimedOut,

    #[error("Callback port {port} is already in use")]
    PortInUse { port: u16 },

    #[error("Failed to start device authorization: {message}")]
    DeviceCodeRequestFailed { message: String },

    #[error("Device authorization rejected: {}", rejection_message(.code, .description))]
    DeviceFlowRejected {
        code: String,
        description: Option<String>,
    },

    #[error("Device authorization timed out")]
    DeviceFlowTimedOut,

    #[error("Failed to refresh access token: {message}")]
    TokenRefreshFailed { message: String },

    #[error("Browser authorization failed ({browser}); device authorization failed ({device})")]
    AllFlowsFailed {
        browser: Box<AuthError>,
        device: Box<AuthError>,
    },

    #[error("OAuth callback listener error: {message}")]
    Listener { message: String },

    #[error("OAuth provider request failed: {message}")]
    Provider { message: String },

    #[error("Failed to persist token to {path}: {message}")]
    TokenStorage { path: String, message: String },
}

/// Google Workspace API errors
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("API request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Unexpected API response: {message}")]
    UnexpectedResponse { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Invalid value for {var}: {value}")]
    InvalidEnvVar { var: String, value: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },
}

fn rejection_message<'a>(code: &'a str, description: &'a Option<String>) -> &'a str {
    description.as_deref().unwrap_or(code)
}

/// Result type alias for Google Workspace MCP operations
pub type Result<T> = std::result::Result<T, WorkspaceMcpError>;

impl WorkspaceMcpError {
    /// Returns the authentication error, if this is one
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            WorkspaceMcpError::Auth(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::MissingRegistration {
            path: "/path/to/credentials.json".to_string(),
        };
        assert!(err.to_string().contains("/path/to/credentials.json"));
    }

    #[test]
    fn test_error_conversion() {
        let auth_err = AuthError::NoAuthorizationCode;
        let err: WorkspaceMcpError = auth_err.into();
        assert!(matches!(err, WorkspaceMcpError::Auth(_)));
        assert!(matches!(err.as_auth(), Some(AuthError::NoAuthorizationCode)));
    }

    #[test]
    fn test_device_rejection_prefers_description() {
        let err = AuthError::DeviceFlowRejected {
            code: "access_denied".to_string(),
            description: Some("The user denied access".to_string()),
        };
        assert!(err.to_string().contains("The user denied access"));

        let err = AuthError::DeviceFlowRejected {
            code: "access_denied".to_string(),
            description: None,
        };
        assert!(err.to_string().contains("access_denied"));
    }

    #[test]
    fn test_all_flows_failed_mentions_both() {
        let err = AuthError::AllFlowsFailed {
            browser: Box::new(AuthError::PortInUse { port: 4100 }),
            device: Box::new(AuthError::DeviceFlowTimedOut),
        };
        let text = err.to_string();
        assert!(text.contains("4100"));
        assert!(text.contains("timed out"));
    }
}
