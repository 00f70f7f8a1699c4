//! Configuration management for the Google Workspace MCP Server
//!
//! Handles paths, environment variables, OAuth endpoints and the fixed scope set.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result, WorkspaceMcpError};

/// Environment variable selecting the interactive authorization flow
pub const AUTH_FLOW_ENV: &str = "GOOGLE_WORKSPACE_MCP_AUTH_FLOW";

/// Name of the per-user configuration directory under `$HOME`
const CONFIG_DIR_NAME: &str = ".google-workspace-mcp";

/// Default loopback port for the OAuth callback
pub const DEFAULT_CALLBACK_PORT: u16 = 4100;

/// Path the loopback listener serves the OAuth callback on
pub const CALLBACK_PATH: &str = "/callback";

/// Scopes covering every tool in the catalogue
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/calendar",
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/presentations",
    "https://www.googleapis.com/auth/contacts",
];

/// Which interactive authorization flow to run when no usable token exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFlow {
    /// Loopback browser redirect only
    Browser,
    /// Device-code polling only
    Device,
    /// Browser first, device code on any browser failure
    #[default]
    Auto,
}

impl FromStr for AuthFlow {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(AuthFlow::Browser),
            "device" => Ok(AuthFlow::Device),
            "auto" | "" => Ok(AuthFlow::Auto),
            other => Err(ConfigError::InvalidEnvVar {
                var: AUTH_FLOW_ENV.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthFlow::Browser => "browser",
            AuthFlow::Device => "device",
            AuthFlow::Auto => "auto",
        };
        f.write_str(name)
    }
}

/// OAuth provider endpoints
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    /// Authorization endpoint (browser redirect flow)
    pub authorization_url: String,

    /// Token endpoint (code exchange, refresh, device polling)
    pub token_url: String,

    /// Device authorization endpoint
    pub device_code_url: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            authorization_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            device_code_url: "https://oauth2.googleapis.com/device/code".to_string(),
        }
    }
}

/// Google Workspace REST API base URLs
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    /// Gmail, scoped to the signed-in user
    pub gmail: String,
    pub calendar: String,
    pub drive: String,
    pub docs: String,
    pub sheets: String,
    pub slides: String,
    pub people: String,
}

impl ApiEndpoints {
    /// Serve every API from one root, keeping each API's versioned path
    pub fn with_root(root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            gmail: format!("{}/gmail/v1/users/me", root),
            calendar: format!("{}/calendar/v3", root),
            drive: format!("{}/drive/v3", root),
            docs: format!("{}/v1", root),
            sheets: format!("{}/v4", root),
            slides: format!("{}/v1", root),
            people: format!("{}/v1", root),
        }
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            gmail: "https://gmail.googleapis.com/gmail/v1/users/me".to_string(),
            calendar: "https://www.googleapis.com/calendar/v3".to_string(),
            drive: "https://www.googleapis.com/drive/v3".to_string(),
            docs: "https://docs.googleapis.com/v1".to_string(),
            sheets: "https://sheets.googleapis.com/v4".to_string(),
            slides: "https://slides.googleapis.com/v1".to_string(),
            people: "https://people.googleapis.com/v1".to_string(),
        }
    }
}

/// Configuration for the Google Workspace MCP Server
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for storing configuration files
    pub config_dir: PathBuf,

    /// Path to the operator-supplied client registration
    pub credentials_path: PathBuf,

    /// Path to the persisted token record
    pub token_path: PathBuf,

    /// OAuth callback port
    pub callback_port: u16,

    /// OAuth scopes requested on every authorization
    pub scopes: Vec<String>,

    /// Interactive flow selection
    pub auth_flow: AuthFlow,

    /// OAuth provider endpoints
    pub endpoints: ProviderEndpoints,

    /// Workspace API endpoints
    pub apis: ApiEndpoints,

    /// How long the browser flow waits for its callback
    pub browser_timeout: Duration,

    /// Whether to launch the system browser for the authorization URL
    pub open_browser: bool,
}

impl Config {
    /// Create a new configuration from the environment and default paths
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var("GOOGLE_WORKSPACE_MCP_CONFIG_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::home_dir()
                .ok_or(WorkspaceMcpError::Config(ConfigError::HomeDirNotFound))?
                .join(CONFIG_DIR_NAME),
        };

        let mut config = Self::with_dir(&config_dir);

        if let Ok(path) = std::env::var("GOOGLE_WORKSPACE_MCP_CREDENTIALS_PATH") {
            config.credentials_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("GOOGLE_WORKSPACE_MCP_TOKEN_PATH") {
            config.token_path = PathBuf::from(path);
        }

        if let Ok(port) = std::env::var("GOOGLE_WORKSPACE_MCP_PORT") {
            config.callback_port = port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: "GOOGLE_WORKSPACE_MCP_PORT".to_string(),
                value: port,
            })?;
        }

        if let Ok(flow) = std::env::var(AUTH_FLOW_ENV) {
            config.auth_flow = flow.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to auto", e);
                AuthFlow::Auto
            });
        }

        config.open_browser = std::env::var_os("GOOGLE_WORKSPACE_MCP_NO_BROWSER").is_none();

        Ok(config)
    }

    /// Create a configuration rooted at `config_dir` without reading the environment
    pub fn with_dir(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();

        Self {
            credentials_path: config_dir.join("credentials.json"),
            token_path: config_dir.join("token.json"),
            config_dir,
            callback_port: DEFAULT_CALLBACK_PORT,
            scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_flow: AuthFlow::Auto,
            endpoints: ProviderEndpoints::default(),
            apis: ApiEndpoints::default(),
            browser_timeout: Duration::from_secs(5 * 60),
            open_browser: true,
        }
    }

    /// Redirect URI registered for the loopback callback
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{}", self.callback_port, CALLBACK_PATH)
    }
}
