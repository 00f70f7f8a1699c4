//! Google Workspace MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing Gmail, Calendar, Drive,
//! Docs, Sheets, Slides and Contacts as tools, backed by an OAuth session
//! manager that supports browser-redirect and device-code authorization.

pub mod auth;
pub mod config;
pub mod error;
pub mod mcp;
pub mod workspace;

pub use auth::SessionManager;
pub use config::{AuthFlow, Config};
pub use error::{Result, WorkspaceMcpError};
