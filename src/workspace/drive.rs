//! Drive tools: listing, search, folders, copy/move, sharing, content and quota

use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{segment, WorkspaceClient};
use crate::error::Result;

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesArgs {
    pub query: Option<String>,
    pub max_results: Option<u32>,
    pub order_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIdArgs {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilesArgs {
    pub query: String,
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderArgs {
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyFileArgs {
    pub file_id: String,
    pub name: Option<String>,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFileArgs {
    pub file_id: String,
    pub new_parent_id: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShareRole {
    #[default]
    Reader,
    Writer,
    Commenter,
}

impl ShareRole {
    fn as_str(self) -> &'static str {
        match self {
            ShareRole::Reader => "reader",
            ShareRole::Writer => "writer",
            ShareRole::Commenter => "commenter",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareFileArgs {
    pub file_id: String,
    pub email: String,
    #[serde(default)]
    pub role: ShareRole,
    pub send_notification: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentArgs {
    pub file_id: String,
    #[allow(dead_code)] // Accepted for schema compatibility; media downloads ignore it
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFileArgs {
    pub file_id: String,
    pub mime_type: String,
}

/// Drive API v3
pub struct Drive<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> Drive<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().drive,
        }
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/files/{}", self.base, segment(file_id))
    }

    pub async fn list_files(&self, args: ListFilesArgs) -> Result<Value> {
        let mut query = vec![
            ("pageSize", args.max_results.unwrap_or(10).to_string()),
            (
                "orderBy",
                args.order_by
                    .unwrap_or_else(|| "modifiedTime desc".to_string()),
            ),
            (
                "fields",
                "files(id, name, mimeType, size, createdTime, modifiedTime, webViewLink, owners)"
                    .to_string(),
            ),
        ];
        if let Some(q) = args.query {
            query.push(("q", q));
        }

        let response = self.client.get(&format!("{}/files", self.base), &query).await?;

        let files: Vec<Value> = files(&response)
            .map(|file| {
                json!({
                    "id": file["id"],
                    "name": file["name"],
                    "mimeType": file["mimeType"],
                    "size": file["size"],
                    "createdTime": file["createdTime"],
                    "modifiedTime": file["modifiedTime"],
                    "webViewLink": file["webViewLink"],
                    "owners": owner_emails(file),
                })
            })
            .collect();

        Ok(json!({ "files": files }))
    }

    pub async fn get_file(&self, args: FileIdArgs) -> Result<Value> {
        let file = self
            .client
            .get(
                &self.file_url(&args.file_id),
                &[(
                    "fields",
                    "id, name, mimeType, size, createdTime, modifiedTime, webViewLink, webContentLink, owners, permissions, parents, shared"
                        .to_string(),
                )],
            )
            .await?;

        Ok(json!({
            "id": file["id"],
            "name": file["name"],
            "mimeType": file["mimeType"],
            "size": file["size"],
            "createdTime": file["createdTime"],
            "modifiedTime": file["modifiedTime"],
            "webViewLink": file["webViewLink"],
            "webContentLink": file["webContentLink"],
            "owners": owner_emails(&file),
            "parents": file["parents"],
            "shared": file["shared"],
        }))
    }

    pub async fn search_files(&self, args: SearchFilesArgs) -> Result<Value> {
        let response = self
            .client
            .get(
                &format!("{}/files", self.base),
                &[
                    ("q", search_query(&args.query)),
                    ("pageSize", args.max_results.unwrap_or(20).to_string()),
                    ("orderBy", "modifiedTime desc".to_string()),
                    (
                        "fields",
                        "files(id, name, mimeType, size, modifiedTime, webViewLink)".to_string(),
                    ),
                ],
            )
            .await?;

        let files: Vec<Value> = files(&response)
            .map(|file| {
                json!({
                    "id": file["id"],
                    "name": file["name"],
                    "mimeType": file["mimeType"],
                    "size": file["size"],
                    "modifiedTime": file["modifiedTime"],
                    "webViewLink": file["webViewLink"],
                })
            })
            .collect();

        Ok(json!({
            "count": files.len(),
            "files": files,
        }))
    }

    pub async fn create_folder(&self, args: CreateFolderArgs) -> Result<Value> {
        let mut body = json!({
            "name": args.name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        if let Some(parent_id) = args.parent_id {
            body["parents"] = json!([parent_id]);
        }

        let folder = self
            .client
            .post(
                &format!("{}/files", self.base),
                &[("fields", "id, name, webViewLink".to_string())],
                &body,
            )
            .await?;

        Ok(json!({
            "id": folder["id"],
            "name": folder["name"],
            "webViewLink": folder["webViewLink"],
            "status": "created",
        }))
    }

    pub async fn delete_file(&self, args: FileIdArgs) -> Result<Value> {
        self.client.delete(&self.file_url(&args.file_id), &[]).await?;
        Ok(json!({ "id": args.file_id, "status": "deleted" }))
    }

    pub async fn copy_file(&self, args: CopyFileArgs) -> Result<Value> {
        let mut body = json!({});
        if let Some(name) = args.name {
            body["name"] = json!(name);
        }
        if let Some(parent_id) = args.parent_id {
            body["parents"] = json!([parent_id]);
        }

        let copy = self
            .client
            .post(
                &format!("{}/copy", self.file_url(&args.file_id)),
                &[("fields", "id, name, webViewLink".to_string())],
                &body,
            )
            .await?;

        Ok(json!({
            "id": copy["id"],
            "name": copy["name"],
            "webViewLink": copy["webViewLink"],
            "status": "copied",
        }))
    }

    pub async fn move_file(&self, args: MoveFileArgs) -> Result<Value> {
        let url = self.file_url(&args.file_id);
        let current = self
            .client
            .get(&url, &[("fields", "parents".to_string())])
            .await?;

        let previous_parents = current["parents"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(",");

        let mut query = vec![
            ("addParents", args.new_parent_id),
            ("fields", "id, name, parents".to_string()),
        ];
        if !previous_parents.is_empty() {
            query.push(("removeParents", previous_parents));
        }

        let moved = self.client.patch(&url, &query, &json!({})).await?;

        Ok(json!({
            "id": moved["id"],
            "name": moved["name"],
            "parents": moved["parents"],
            "status": "moved",
        }))
    }

    pub async fn share_file(&self, args: ShareFileArgs) -> Result<Value> {
        let permission = self
            .client
            .post(
                &format!("{}/permissions", self.file_url(&args.file_id)),
                &[
                    (
                        "sendNotificationEmail",
                        args.send_notification.unwrap_or(true).to_string(),
                    ),
                    ("fields", "id".to_string()),
                ],
                &json!({
                    "type": "user",
                    "role": args.role.as_str(),
                    "emailAddress": args.email,
                }),
            )
            .await?;

        Ok(json!({
            "fileId": args.file_id,
            "permissionId": permission["id"],
            "email": args.email,
            "role": args.role.as_str(),
            "status": "shared",
        }))
    }

    pub async fn get_file_content(&self, args: FileContentArgs) -> Result<Value> {
        let content = self
            .client
            .get_text(&self.file_url(&args.file_id), &[("alt", "media".to_string())])
            .await?;

        Ok(json!({ "fileId": args.file_id, "content": content }))
    }

    pub async fn export_file(&self, args: ExportFileArgs) -> Result<Value> {
        let content = self
            .client
            .get_text(
                &format!("{}/export", self.file_url(&args.file_id)),
                &[("mimeType", args.mime_type.clone())],
            )
            .await?;

        Ok(json!({
            "fileId": args.file_id,
            "mimeType": args.mime_type,
            "content": content,
        }))
    }

    pub async fn get_storage_quota(&self) -> Result<Value> {
        let about = self
            .client
            .get(
                &format!("{}/about", self.base),
                &[("fields", "storageQuota, user".to_string())],
            )
            .await?;
        let quota = &about["storageQuota"];

        Ok(json!({
            "user": about["user"]["emailAddress"],
            "limit": quota["limit"],
            "usage": quota["usage"],
            "usageInDrive": quota["usageInDrive"],
            "usageInDriveTrash": quota["usageInDriveTrash"],
        }))
    }
}

fn files(response: &Value) -> impl Iterator<Item = &Value> {
    response["files"].as_array().into_iter().flatten()
}

fn owner_emails(file: &Value) -> Value {
    match file["owners"].as_array() {
        Some(owners) => owners.iter().map(|o| o["emailAddress"].clone()).collect(),
        None => Value::Null,
    }
}

/// Full-text or name match, with single quotes escaped for the Drive query language
fn search_query(term: &str) -> String {
    let escaped = term.replace('\\', "\\\\").replace('\'', "\\'");
    format!("fullText contains '{0}' or name contains '{0}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, WorkspaceMcpError};
    use crate::workspace::client::test_client;

    #[test]
    fn test_search_query_escapes_quotes() {
        assert_eq!(
            search_query("budget"),
            "fullText contains 'budget' or name contains 'budget'"
        );
        assert_eq!(
            search_query("Bob's notes"),
            "fullText contains 'Bob\\'s notes' or name contains 'Bob\\'s notes'"
        );
    }

    #[test]
    fn test_share_role_default() {
        let args: ShareFileArgs =
            serde_json::from_value(json!({"fileId": "f1", "email": "a@example.com"})).unwrap();
        assert_eq!(args.role, ShareRole::Reader);

        let args: ShareFileArgs = serde_json::from_value(
            json!({"fileId": "f1", "email": "a@example.com", "role": "writer"}),
        )
        .unwrap();
        assert_eq!(args.role, ShareRole::Writer);
    }

    #[test]
    fn test_owner_emails() {
        let file = json!({"owners": [{"emailAddress": "a@example.com", "displayName": "A"}]});
        assert_eq!(owner_emails(&file), json!(["a@example.com"]));
        assert_eq!(owner_emails(&json!({})), Value::Null);
    }

    #[tokio::test]
    async fn test_get_file_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files/gone")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":{"code":404,"message":"File not found: gone."}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let args: FileIdArgs = serde_json::from_value(json!({"fileId": "gone"})).unwrap();
        let err = client.drive().get_file(args).await.unwrap_err();

        assert!(matches!(
            err,
            WorkspaceMcpError::Api(ApiError::NotFound { .. })
        ));
    }
}
