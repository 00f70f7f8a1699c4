//! Operator-supplied OAuth client registration (`credentials.json`)

use std::path::Path;

use serde::Deserialize;

use super::AuthResult;
use crate::error::AuthError;

/// OAuth client credentials issued by the identity provider
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistration {
    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Redirect URIs registered with the provider
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// Registration file format (can be "installed" or "web")
#[derive(Debug, Deserialize)]
struct RegistrationFile {
    installed: Option<ClientRegistration>,
    web: Option<ClientRegistration>,
}

impl ClientRegistration {
    /// Load the registration, preferring the "installed" shape over "web"
    pub fn load(path: &Path) -> AuthResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AuthError::MissingRegistration {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(AuthError::InvalidRegistration {
                    message: format!("{}: {}", path.display(), e),
                });
            }
        };

        Self::parse(&content)
    }

    /// Parse registration JSON
    pub fn parse(content: &str) -> AuthResult<Self> {
        let file: RegistrationFile =
            serde_json::from_str(content).map_err(|e| AuthError::InvalidRegistration {
                message: e.to_string(),
            })?;

        file.installed
            .or(file.web)
            .ok_or_else(|| AuthError::InvalidRegistration {
                message: "expected 'installed' or 'web' credentials".to_string(),
            })
    }
}

/// Operator guidance for a registration error, if the error has any
pub fn setup_instructions(err: &AuthError, path: &Path) -> Option<String> {
    let path = path.display();

    let problem = match err {
        AuthError::MissingRegistration { .. } => format!("No credentials found at: {}", path),
        AuthError::InvalidRegistration { message } => {
            format!("Credentials at {} could not be used: {}", path, message)
        }
        _ => return None,
    };

    Some(format!(
        "\n=== Google Workspace MCP Setup ===\n\
         \n{problem}\n\
         \nTo set up authentication:\n\
         1. Go to https://console.cloud.google.com/\n\
         2. Create a project (or select existing)\n\
         3. Enable the Gmail, Calendar, Drive, Docs, Sheets, Slides and People APIs\n\
         4. Create OAuth 2.0 credentials (Desktop app type)\n\
         5. Download the JSON and save it as:\n   \
         {path}\n\
         \nThen run this command again.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_registration() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let registration = ClientRegistration::parse(json).unwrap();
        assert_eq!(registration.client_id, "test-client-id");
        assert_eq!(registration.redirect_uris, vec!["http://localhost"]);
    }

    #[test]
    fn test_web_registration() {
        let json = r#"{"web": {"client_id": "web-id", "client_secret": "web-secret"}}"#;

        let registration = ClientRegistration::parse(json).unwrap();
        assert_eq!(registration.client_id, "web-id");
        assert!(registration.redirect_uris.is_empty());
    }

    #[test]
    fn test_neither_shape_is_invalid() {
        let err = ClientRegistration::parse(r#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidRegistration { .. }));

        let err = ClientRegistration::parse("not json").unwrap_err();
        assert!(matches!(err, AuthError::InvalidRegistration { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientRegistration::load(&dir.path().join("credentials.json")).unwrap_err();
        assert!(matches!(err, AuthError::MissingRegistration { .. }));
    }

    #[test]
    fn test_setup_instructions_cover_registration_errors() {
        let path = Path::new("/home/op/.google-workspace-mcp/credentials.json");

        let missing = AuthError::MissingRegistration {
            path: path.display().to_string(),
        };
        let help = setup_instructions(&missing, path).unwrap();
        assert!(help.contains("No credentials found at: /home/op/.google-workspace-mcp/credentials.json"));
        assert!(help.contains("Desktop app"));

        let invalid = AuthError::InvalidRegistration {
            message: "expected 'installed' or 'web' credentials".to_string(),
        };
        let help = setup_instructions(&invalid, path).unwrap();
        assert!(help.contains("could not be used: expected 'installed' or 'web' credentials"));
        assert!(help.contains("Download the JSON and save it as:\n   /home/op/.google-workspace-mcp/credentials.json"));

        assert!(setup_instructions(&AuthError::DeviceFlowTimedOut, path).is_none());
    }
}
