//! MCP tool dispatch
//!
//! Routes `tools/call` requests to the Workspace API clients and renders
//! their JSON results as MCP text content.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{McpError, Result};
use crate::mcp::catalog;
use crate::mcp::types::{CallToolResult, Tool};
use crate::workspace::WorkspaceClient;

/// Arguments for tools that take none; rejects non-object input
#[derive(Debug, Deserialize)]
struct NoArgs {}

/// Tool handler
pub struct ToolHandler {
    workspace: Arc<WorkspaceClient>,
}

impl ToolHandler {
    /// Create a new tool handler
    pub fn new(workspace: Arc<WorkspaceClient>) -> Self {
        Self { workspace }
    }

    /// List all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        catalog::tools()
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, args: Value) -> CallToolResult {
        let args = match args {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        match self.dispatch(name, args).await {
            Ok(result) => match serde_json::to_string_pretty(&result) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => CallToolResult::error(e.to_string()),
            },
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                CallToolResult::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        let ws = &self.workspace;

        match name {
            // Gmail
            "search_emails" => ws.gmail().search_emails(parse_args(args)?).await,
            "read_email" => ws.gmail().read_email(parse_args(args)?).await,
            "send_email" => ws.gmail().send_email(parse_args(args)?).await,
            "reply_to_email" => ws.gmail().reply_to_email(parse_args(args)?).await,
            "create_draft" => ws.gmail().create_draft(parse_args(args)?).await,
            "trash_email" => ws.gmail().trash_email(parse_args(args)?).await,
            "mark_as_read" => ws.gmail().mark_as_read(parse_args(args)?).await,
            "mark_as_unread" => ws.gmail().mark_as_unread(parse_args(args)?).await,
            "list_labels" => {
                parse_args::<NoArgs>(args)?;
                ws.gmail().list_labels().await
            }
            "add_label" => ws.gmail().add_label(parse_args(args)?).await,
            "get_profile" => {
                parse_args::<NoArgs>(args)?;
                ws.gmail().get_profile().await
            }

            // Calendar
            "list_calendars" => {
                parse_args::<NoArgs>(args)?;
                ws.calendar().list_calendars().await
            }
            "list_events" => ws.calendar().list_events(parse_args(args)?).await,
            "get_event" => ws.calendar().get_event(parse_args(args)?).await,
            "create_event" => ws.calendar().create_event(parse_args(args)?).await,
            "update_event" => ws.calendar().update_event(parse_args(args)?).await,
            "delete_event" => ws.calendar().delete_event(parse_args(args)?).await,
            "find_free_time" => ws.calendar().find_free_time(parse_args(args)?).await,
            "quick_add_event" => ws.calendar().quick_add_event(parse_args(args)?).await,

            // Drive
            "list_files" => ws.drive().list_files(parse_args(args)?).await,
            "get_file" => ws.drive().get_file(parse_args(args)?).await,
            "search_files" => ws.drive().search_files(parse_args(args)?).await,
            "create_folder" => ws.drive().create_folder(parse_args(args)?).await,
            "delete_file" => ws.drive().delete_file(parse_args(args)?).await,
            "copy_file" => ws.drive().copy_file(parse_args(args)?).await,
            "move_file" => ws.drive().move_file(parse_args(args)?).await,
            "share_file" => ws.drive().share_file(parse_args(args)?).await,
            "get_file_content" => ws.drive().get_file_content(parse_args(args)?).await,
            "export_file" => ws.drive().export_file(parse_args(args)?).await,
            "get_storage_quota" => {
                parse_args::<NoArgs>(args)?;
                ws.drive().get_storage_quota().await
            }

            // Docs
            "list_doc_structure" => ws.docs().list_doc_structure(parse_args(args)?).await,
            "read_doc_text" => ws.docs().read_doc_text(parse_args(args)?).await,
            "create_doc" => ws.docs().create_doc(parse_args(args)?).await,
            "append_doc_text" => ws.docs().append_doc_text(parse_args(args)?).await,

            // Sheets
            "get_sheet_values" => ws.sheets().get_sheet_values(parse_args(args)?).await,
            "update_sheet_values" => ws.sheets().update_sheet_values(parse_args(args)?).await,
            "append_sheet_values" => ws.sheets().append_sheet_values(parse_args(args)?).await,
            "create_spreadsheet" => ws.sheets().create_spreadsheet(parse_args(args)?).await,

            // Slides
            "get_presentation" => ws.slides().get_presentation(parse_args(args)?).await,
            "create_presentation" => ws.slides().create_presentation(parse_args(args)?).await,
            "create_slide" => ws.slides().create_slide(parse_args(args)?).await,

            // Contacts
            "list_contacts" => ws.people().list_contacts(parse_args(args)?).await,
            "search_contacts" => ws.people().search_contacts(parse_args(args)?).await,
            "create_contact" => ws.people().create_contact(parse_args(args)?).await,
            "get_contact" => ws.people().get_contact(parse_args(args)?).await,

            _ => Err(McpError::UnknownTool {
                name: name.to_string(),
            }
            .into()),
        }
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| {
        McpError::InvalidArguments {
            message: e.to_string(),
        }
        .into()
    })
}
