//! Google Workspace API surface exposed as MCP tools
//!
//! Each submodule wraps one REST API and shapes its responses into the
//! compact JSON objects returned to MCP clients.

pub mod calendar;
pub mod client;
pub mod docs;
pub mod drive;
pub mod gmail;
pub mod people;
pub mod sheets;
pub mod slides;

pub use client::WorkspaceClient;
