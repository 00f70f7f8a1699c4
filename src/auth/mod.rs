//! OAuth credential and session lifecycle
//!
//! Handles the OAuth 2.0 lifecycle for Google Workspace:
//! - Loading the operator's client registration
//! - Silent refresh of a persisted token
//! - Browser-redirect and device-code interactive flows
//! - Token persistence and refresh-ahead for API calls

pub mod browser;
pub mod clock;
pub mod device;
pub mod manager;
pub mod provider;
pub mod registration;
pub mod session;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::SessionManager;
pub use registration::ClientRegistration;
pub use session::AuthenticatedClient;
pub use token::{TokenRecord, TokenStore};

use crate::error::AuthError;

/// Result type for the authentication internals
pub type AuthResult<T> = std::result::Result<T, AuthError>;
