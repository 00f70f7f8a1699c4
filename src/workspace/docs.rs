//! Docs tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{segment, WorkspaceClient};
use crate::error::{ApiError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIdArgs {
    pub document_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocArgs {
    pub title: String,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendDocTextArgs {
    pub document_id: String,
    pub text: String,
}

/// Docs API v1
pub struct Docs<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> Docs<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().docs,
        }
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}", self.base, segment(document_id))
    }

    async fn insert_text(&self, document_id: &str, index: i64, text: &str) -> Result<Value> {
        self.client
            .post(
                &format!("{}:batchUpdate", self.document_url(document_id)),
                &[],
                &json!({
                    "requests": [{
                        "insertText": {
                            "location": { "index": index },
                            "text": text,
                        }
                    }]
                }),
            )
            .await
    }

    pub async fn list_doc_structure(&self, args: DocumentIdArgs) -> Result<Value> {
        let document = self
            .client
            .get(&self.document_url(&args.document_id), &[])
            .await?;
        let content = body_content(&document);

        let elements: Vec<Value> = content
            .iter()
            .enumerate()
            .map(|(index, element)| {
                json!({
                    "index": index,
                    "type": element_kind(element),
                    "startIndex": element["startIndex"],
                    "endIndex": element["endIndex"],
                })
            })
            .collect();

        Ok(json!({
            "documentId": document["documentId"],
            "title": document["title"],
            "elementCount": elements.len(),
            "elements": elements,
        }))
    }

    pub async fn read_doc_text(&self, args: DocumentIdArgs) -> Result<Value> {
        let document = self
            .client
            .get(&self.document_url(&args.document_id), &[])
            .await?;

        Ok(json!({
            "documentId": document["documentId"],
            "title": document["title"],
            "text": plain_text(&document).trim(),
        }))
    }

    pub async fn create_doc(&self, args: CreateDocArgs) -> Result<Value> {
        let created = self
            .client
            .post(
                &format!("{}/documents", self.base),
                &[],
                &json!({ "title": args.title }),
            )
            .await?;

        let document_id = created["documentId"]
            .as_str()
            .ok_or_else(|| ApiError::UnexpectedResponse {
                message: "created document has no documentId".to_string(),
            })?
            .to_string();

        if let Some(content) = args.content.filter(|c| !c.is_empty()) {
            self.insert_text(&document_id, 1, &content).await?;
        }

        Ok(json!({
            "documentId": document_id,
            "title": created["title"],
            "status": "created",
        }))
    }

    pub async fn append_doc_text(&self, args: AppendDocTextArgs) -> Result<Value> {
        let document = self
            .client
            .get(&self.document_url(&args.document_id), &[])
            .await?;

        let index = append_index(&document);
        self.insert_text(&args.document_id, index, &args.text).await?;

        Ok(json!({ "documentId": args.document_id, "status": "appended" }))
    }
}

fn body_content(document: &Value) -> &[Value] {
    document["body"]["content"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn element_kind(element: &Value) -> &'static str {
    if element.get("paragraph").is_some() {
        "paragraph"
    } else if element.get("table").is_some() {
        "table"
    } else if element.get("sectionBreak").is_some() {
        "sectionBreak"
    } else {
        "other"
    }
}

/// Concatenated text runs of every top-level paragraph
fn plain_text(document: &Value) -> String {
    body_content(document)
        .iter()
        .filter_map(|element| element["paragraph"]["elements"].as_array())
        .flatten()
        .filter_map(|run| run["textRun"]["content"].as_str())
        .collect()
}

/// Insert position just before the trailing newline of the body, never below 1
fn append_index(document: &Value) -> i64 {
    let end = body_content(document)
        .last()
        .and_then(|element| element["endIndex"].as_i64())
        .unwrap_or(1);
    (end - 1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkspaceMcpError;
    use crate::workspace::client::test_client;

    fn sample_document() -> Value {
        json!({
            "documentId": "doc1",
            "title": "Notes",
            "body": {
                "content": [
                    {"startIndex": 0, "endIndex": 1, "sectionBreak": {}},
                    {"startIndex": 1, "endIndex": 7, "paragraph": {
                        "elements": [{"textRun": {"content": "Hello "}}]
                    }},
                    {"startIndex": 7, "endIndex": 14, "paragraph": {
                        "elements": [
                            {"textRun": {"content": "world\n"}},
                            {"inlineObjectElement": {}}
                        ]
                    }},
                    {"startIndex": 14, "endIndex": 20, "table": {}}
                ]
            }
        })
    }

    #[test]
    fn test_element_kinds() {
        let document = sample_document();
        let kinds: Vec<&str> = body_content(&document).iter().map(element_kind).collect();
        assert_eq!(kinds, vec!["sectionBreak", "paragraph", "paragraph", "table"]);
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(plain_text(&sample_document()), "Hello world\n");
        assert_eq!(plain_text(&json!({})), "");
    }

    #[test]
    fn test_append_index() {
        assert_eq!(append_index(&sample_document()), 19);
        assert_eq!(append_index(&json!({"body": {"content": []}})), 1);
        assert_eq!(
            append_index(&json!({"body": {"content": [{"endIndex": 1}]}})),
            1
        );
    }

    #[tokio::test]
    async fn test_create_doc_inserts_initial_content() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/v1/documents")
            .match_body(mockito::Matcher::Json(json!({"title": "Notes"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"documentId": "d1", "title": "Notes"}).to_string())
            .create_async()
            .await;
        let insert = server
            .mock("POST", "/v1/documents/d1:batchUpdate")
            .match_body(mockito::Matcher::PartialJson(json!({
                "requests": [{"insertText": {"location": {"index": 1}, "text": "Hello"}}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client
            .docs()
            .create_doc(CreateDocArgs {
                title: "Notes".to_string(),
                content: Some("Hello".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(result["documentId"], "d1");
        assert_eq!(result["status"], "created");
        create.assert_async().await;
        insert.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_doc_without_document_id() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/documents")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"title":"Notes"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client
            .docs()
            .create_doc(CreateDocArgs {
                title: "Notes".to_string(),
                content: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WorkspaceMcpError::Api(ApiError::UnexpectedResponse { .. })
        ));
    }
}
