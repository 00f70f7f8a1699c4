//! Tool catalogue advertised through `tools/list`

use serde_json::{json, Value};

use crate::mcp::types::Tool;

fn tool_def(name: &str, description: &str, schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: Some(description.to_string()),
        input_schema: schema,
    }
}

fn no_args() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Every tool the server exposes, grouped by service
pub fn tools() -> Vec<Tool> {
    let mut tools = gmail_tools();
    tools.extend(calendar_tools());
    tools.extend(drive_tools());
    tools.extend(docs_tools());
    tools.extend(sheets_tools());
    tools.extend(slides_tools());
    tools.extend(people_tools());
    tools
}

// ==================== Gmail ====================

fn message_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "messageId": {"type": "string", "description": "Gmail message ID"}
        },
        "required": ["messageId"]
    })
}

fn compose_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "to": {"type": "string", "description": "Recipient email address"},
            "subject": {"type": "string", "description": "Email subject"},
            "body": {"type": "string", "description": "Email body text"},
            "cc": {"type": "string", "description": "CC recipients (optional)"},
            "bcc": {"type": "string", "description": "BCC recipients (optional)"}
        },
        "required": ["to", "subject", "body"]
    })
}

fn gmail_tools() -> Vec<Tool> {
    vec![
        tool_def(
            "search_emails",
            "Search emails using Gmail query syntax (e.g., \"is:unread\", \"from:example@gmail.com\")",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Gmail search query"},
                    "maxResults": {"type": "number", "description": "Maximum number of results (default: 10)"}
                },
                "required": ["query"]
            }),
        ),
        tool_def("read_email", "Read a specific email by its message ID", message_id_schema()),
        tool_def("send_email", "Send a new email", compose_schema()),
        tool_def(
            "reply_to_email",
            "Reply to an existing email",
            json!({
                "type": "object",
                "properties": {
                    "messageId": {"type": "string", "description": "ID of message to reply to"},
                    "body": {"type": "string", "description": "Reply body text"}
                },
                "required": ["messageId", "body"]
            }),
        ),
        tool_def("create_draft", "Create an email draft", compose_schema()),
        tool_def("trash_email", "Move an email to trash", message_id_schema()),
        tool_def("mark_as_read", "Mark an email as read", message_id_schema()),
        tool_def("mark_as_unread", "Mark an email as unread", message_id_schema()),
        tool_def("list_labels", "List all Gmail labels", no_args()),
        tool_def(
            "add_label",
            "Add a label to a message",
            json!({
                "type": "object",
                "properties": {
                    "messageId": {"type": "string", "description": "Gmail message ID"},
                    "labelId": {"type": "string", "description": "Label ID to add"}
                },
                "required": ["messageId", "labelId"]
            }),
        ),
        tool_def("get_profile", "Get Gmail profile information", no_args()),
    ]
}

// ==================== Calendar ====================

fn event_ref_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "calendarId": {"type": "string", "description": "Calendar ID (default: \"primary\")"},
            "eventId": {"type": "string", "description": "Event ID"}
        },
        "required": ["eventId"]
    })
}

fn calendar_tools() -> Vec<Tool> {
    vec![
        tool_def("list_calendars", "List all available calendars", no_args()),
        tool_def(
            "list_events",
            "List upcoming calendar events",
            json!({
                "type": "object",
                "properties": {
                    "calendarId": {"type": "string", "description": "Calendar ID (default: \"primary\")"},
                    "maxResults": {"type": "number", "description": "Maximum number of results (default: 10)"},
                    "timeMin": {"type": "string", "description": "Start time (ISO 8601 format)"},
                    "timeMax": {"type": "string", "description": "End time (ISO 8601 format)"}
                }
            }),
        ),
        tool_def("get_event", "Get details of a specific calendar event", event_ref_schema()),
        tool_def(
            "create_event",
            "Create a new calendar event",
            json!({
                "type": "object",
                "properties": {
                    "calendarId": {"type": "string", "description": "Calendar ID (default: \"primary\")"},
                    "summary": {"type": "string", "description": "Event title"},
                    "description": {"type": "string", "description": "Event description"},
                    "location": {"type": "string", "description": "Event location"},
                    "start": {"type": "string", "description": "Start time (ISO 8601 format)"},
                    "end": {"type": "string", "description": "End time (ISO 8601 format)"},
                    "attendees": {"type": "array", "items": {"type": "string"}, "description": "Attendee email addresses"},
                    "timeZone": {"type": "string", "description": "Time zone"}
                },
                "required": ["summary", "start", "end"]
            }),
        ),
        tool_def(
            "update_event",
            "Update an existing calendar event",
            json!({
                "type": "object",
                "properties": {
                    "calendarId": {"type": "string", "description": "Calendar ID (default: \"primary\")"},
                    "eventId": {"type": "string", "description": "Event ID"},
                    "summary": {"type": "string", "description": "Event title"},
                    "description": {"type": "string", "description": "Event description"},
                    "location": {"type": "string", "description": "Event location"},
                    "start": {"type": "string", "description": "Start time (ISO 8601 format)"},
                    "end": {"type": "string", "description": "End time (ISO 8601 format)"},
                    "attendees": {"type": "array", "items": {"type": "string"}, "description": "Attendee email addresses"}
                },
                "required": ["eventId"]
            }),
        ),
        tool_def("delete_event", "Delete a calendar event", event_ref_schema()),
        tool_def(
            "find_free_time",
            "Find free time slots across calendars",
            json!({
                "type": "object",
                "properties": {
                    "timeMin": {"type": "string", "description": "Start time (ISO 8601 format)"},
                    "timeMax": {"type": "string", "description": "End time (ISO 8601 format)"},
                    "calendars": {"type": "array", "items": {"type": "string"}, "description": "Calendar IDs to check"}
                },
                "required": ["timeMin", "timeMax"]
            }),
        ),
        tool_def(
            "quick_add_event",
            "Create event using natural language (e.g., \"Lunch tomorrow at noon\")",
            json!({
                "type": "object",
                "properties": {
                    "calendarId": {"type": "string", "description": "Calendar ID (default: \"primary\")"},
                    "text": {"type": "string", "description": "Natural language event description"}
                },
                "required": ["text"]
            }),
        ),
    ]
}

// ==================== Drive ====================

fn file_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "fileId": {"type": "string", "description": "File ID"}
        },
        "required": ["fileId"]
    })
}

fn drive_tools() -> Vec<Tool> {
    vec![
        tool_def(
            "list_files",
            "List files in Google Drive",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Drive query string"},
                    "maxResults": {"type": "number", "description": "Maximum number of results (default: 10)"},
                    "orderBy": {"type": "string", "description": "Order by (e.g., \"modifiedTime desc\")"}
                }
            }),
        ),
        tool_def("get_file", "Get metadata for a specific file", file_id_schema()),
        tool_def(
            "search_files",
            "Search files by name or content",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "maxResults": {"type": "number", "description": "Maximum number of results (default: 20)"}
                },
                "required": ["query"]
            }),
        ),
        tool_def(
            "create_folder",
            "Create a new folder in Drive",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Folder name"},
                    "parentId": {"type": "string", "description": "Parent folder ID (optional)"}
                },
                "required": ["name"]
            }),
        ),
        tool_def("delete_file", "Delete a file from Drive", file_id_schema()),
        tool_def(
            "copy_file",
            "Create a copy of a file",
            json!({
                "type": "object",
                "properties": {
                    "fileId": {"type": "string", "description": "File ID to copy"},
                    "name": {"type": "string", "description": "New file name (optional)"},
                    "parentId": {"type": "string", "description": "Parent folder ID (optional)"}
                },
                "required": ["fileId"]
            }),
        ),
        tool_def(
            "move_file",
            "Move a file to a different folder",
            json!({
                "type": "object",
                "properties": {
                    "fileId": {"type": "string", "description": "File ID"},
                    "newParentId": {"type": "string", "description": "New parent folder ID"}
                },
                "required": ["fileId", "newParentId"]
            }),
        ),
        tool_def(
            "share_file",
            "Share a file with someone",
            json!({
                "type": "object",
                "properties": {
                    "fileId": {"type": "string", "description": "File ID"},
                    "email": {"type": "string", "description": "Email address to share with"},
                    "role": {"type": "string", "enum": ["reader", "writer", "commenter"], "description": "Permission role"},
                    "sendNotification": {"type": "boolean", "description": "Send email notification"}
                },
                "required": ["fileId", "email"]
            }),
        ),
        tool_def(
            "get_file_content",
            "Get content of a text file",
            json!({
                "type": "object",
                "properties": {
                    "fileId": {"type": "string", "description": "File ID"},
                    "mimeType": {"type": "string", "description": "MIME type (optional)"}
                },
                "required": ["fileId"]
            }),
        ),
        tool_def(
            "export_file",
            "Export a Google Doc/Sheet/Slides to another format",
            json!({
                "type": "object",
                "properties": {
                    "fileId": {"type": "string", "description": "File ID"},
                    "mimeType": {"type": "string", "description": "Export MIME type (e.g., \"text/plain\", \"application/pdf\")"}
                },
                "required": ["fileId", "mimeType"]
            }),
        ),
        tool_def("get_storage_quota", "Get Drive storage quota information", no_args()),
    ]
}

// ==================== Docs ====================

fn document_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "documentId": {"type": "string", "description": "Google Docs document ID"}
        },
        "required": ["documentId"]
    })
}

fn docs_tools() -> Vec<Tool> {
    vec![
        tool_def(
            "list_doc_structure",
            "List the top-level structural elements of a document",
            document_id_schema(),
        ),
        tool_def("read_doc_text", "Read the plain text of a document", document_id_schema()),
        tool_def(
            "create_doc",
            "Create a new document, optionally with initial content",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Document title"},
                    "content": {"type": "string", "description": "Initial text (optional)"}
                },
                "required": ["title"]
            }),
        ),
        tool_def(
            "append_doc_text",
            "Append text to the end of a document",
            json!({
                "type": "object",
                "properties": {
                    "documentId": {"type": "string", "description": "Google Docs document ID"},
                    "text": {"type": "string", "description": "Text to append"}
                },
                "required": ["documentId", "text"]
            }),
        ),
    ]
}

// ==================== Sheets ====================

fn write_values_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "spreadsheetId": {"type": "string", "description": "Spreadsheet ID"},
            "range": {"type": "string", "description": "A1 notation range (e.g., \"Sheet1!A1:C3\")"},
            "values": {
                "type": "array",
                "items": {"type": "array", "items": {"type": ["string", "number", "boolean"]}},
                "description": "Rows of cell values"
            },
            "valueInputOption": {
                "type": "string",
                "enum": ["RAW", "USER_ENTERED"],
                "description": "How input is interpreted (default: USER_ENTERED)"
            }
        },
        "required": ["spreadsheetId", "range", "values"]
    })
}

fn sheets_tools() -> Vec<Tool> {
    vec![
        tool_def(
            "get_sheet_values",
            "Read cell values from a spreadsheet range",
            json!({
                "type": "object",
                "properties": {
                    "spreadsheetId": {"type": "string", "description": "Spreadsheet ID"},
                    "range": {"type": "string", "description": "A1 notation range (e.g., \"Sheet1!A1:C3\")"}
                },
                "required": ["spreadsheetId", "range"]
            }),
        ),
        tool_def(
            "update_sheet_values",
            "Overwrite cell values in a spreadsheet range",
            write_values_schema(),
        ),
        tool_def(
            "append_sheet_values",
            "Append rows after the table found in a spreadsheet range",
            write_values_schema(),
        ),
        tool_def(
            "create_spreadsheet",
            "Create a new spreadsheet",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Spreadsheet title"},
                    "sheetTitle": {"type": "string", "description": "Title of the first sheet (default: \"Sheet1\")"}
                },
                "required": ["title"]
            }),
        ),
    ]
}

// ==================== Slides ====================

fn slides_tools() -> Vec<Tool> {
    vec![
        tool_def(
            "get_presentation",
            "Get a presentation's title and slide summary",
            json!({
                "type": "object",
                "properties": {
                    "presentationId": {"type": "string", "description": "Presentation ID"}
                },
                "required": ["presentationId"]
            }),
        ),
        tool_def(
            "create_presentation",
            "Create a new presentation",
            json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Presentation title"}
                },
                "required": ["title"]
            }),
        ),
        tool_def(
            "create_slide",
            "Add a slide to a presentation",
            json!({
                "type": "object",
                "properties": {
                    "presentationId": {"type": "string", "description": "Presentation ID"},
                    "layout": {"type": "string", "description": "Predefined layout (default: TITLE_AND_BODY)"}
                },
                "required": ["presentationId"]
            }),
        ),
    ]
}

// ==================== Contacts ====================

fn people_tools() -> Vec<Tool> {
    vec![
        tool_def(
            "list_contacts",
            "List the user's contacts",
            json!({
                "type": "object",
                "properties": {
                    "pageSize": {"type": "number", "description": "Contacts per page (default: 50)"},
                    "pageToken": {"type": "string", "description": "Token from a previous page"}
                }
            }),
        ),
        tool_def(
            "search_contacts",
            "Search contacts by name, email or phone",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search query"},
                    "pageSize": {"type": "number", "description": "Maximum number of results (default: 20)"}
                },
                "required": ["query"]
            }),
        ),
        tool_def(
            "create_contact",
            "Create a new contact",
            json!({
                "type": "object",
                "properties": {
                    "givenName": {"type": "string", "description": "First name"},
                    "familyName": {"type": "string", "description": "Last name (optional)"},
                    "email": {"type": "string", "description": "Email address (optional)"},
                    "phone": {"type": "string", "description": "Phone number (optional)"},
                    "company": {"type": "string", "description": "Company name (optional)"}
                },
                "required": ["givenName"]
            }),
        ),
        tool_def(
            "get_contact",
            "Get a contact by resource name",
            json!({
                "type": "object",
                "properties": {
                    "resourceName": {"type": "string", "description": "Contact resource name (e.g., \"people/c123\")"}
                },
                "required": ["resourceName"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_names_are_unique() {
        let tools = tools();
        let names: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 45);
    }

    #[test]
    fn test_required_fields_are_declared() {
        for tool in tools() {
            let schema = &tool.input_schema;
            assert_eq!(schema["type"], "object", "{}", tool.name);

            let properties = schema["properties"].as_object().unwrap();
            for required in schema["required"].as_array().into_iter().flatten() {
                let field = required.as_str().unwrap();
                assert!(
                    properties.contains_key(field),
                    "{} requires undeclared field {}",
                    tool.name,
                    field
                );
            }
        }
    }
}
