//! Gmail tools: search, read, send, reply, drafts, labels and profile

use base64::{engine::general_purpose, Engine};
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{segment, WorkspaceClient};
use crate::error::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEmailsArgs {
    pub query: String,
    pub max_results: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIdArgs {
    pub message_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyArgs {
    pub message_id: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLabelArgs {
    pub message_id: String,
    pub label_id: String,
}

/// Gmail API (`users/me`)
pub struct Gmail<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> Gmail<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().gmail,
        }
    }

    fn message_url(&self, id: &str) -> String {
        format!("{}/messages/{}", self.base, segment(id))
    }

    async fn metadata(&self, id: &str, headers: &[&str]) -> Result<Value> {
        let mut query = vec![("format", "metadata".to_string())];
        query.extend(headers.iter().map(|h| ("metadataHeaders", h.to_string())));
        self.client.get(&self.message_url(id), &query).await
    }

    pub async fn search_emails(&self, args: SearchEmailsArgs) -> Result<Value> {
        let max_results = args.max_results.unwrap_or(10);
        let list = self
            .client
            .get(
                &format!("{}/messages", self.base),
                &[
                    ("q", args.query),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;

        let mut messages = Vec::new();
        for message in list["messages"]
            .as_array()
            .into_iter()
            .flatten()
            .take(max_results as usize)
        {
            let Some(id) = message["id"].as_str() else {
                continue;
            };
            let detail = self.metadata(id, &["From", "To", "Subject", "Date"]).await?;

            messages.push(json!({
                "id": id,
                "threadId": message["threadId"],
                "from": header(&detail, "from"),
                "to": header(&detail, "to"),
                "subject": header(&detail, "subject"),
                "date": header(&detail, "date"),
                "snippet": detail["snippet"],
            }));
        }

        Ok(json!({
            "count": messages.len(),
            "messages": messages,
        }))
    }

    pub async fn read_email(&self, args: MessageIdArgs) -> Result<Value> {
        let message = self
            .client
            .get(&self.message_url(&args.message_id), &[("format", "full".to_string())])
            .await?;

        let body = plain_text_body(&message["payload"]);
        let body = if body.is_empty() {
            message["snippet"].clone()
        } else {
            Value::String(body)
        };

        Ok(json!({
            "id": message["id"],
            "threadId": message["threadId"],
            "from": header(&message, "from"),
            "to": header(&message, "to"),
            "cc": header(&message, "cc"),
            "subject": header(&message, "subject"),
            "date": header(&message, "date"),
            "body": body,
            "labels": message["labelIds"],
        }))
    }

    pub async fn send_email(&self, args: ComposeArgs) -> Result<Value> {
        let raw = encode_raw_message(&compose_message(&args));
        let sent = self
            .client
            .post(&format!("{}/messages/send", self.base), &[], &json!({ "raw": raw }))
            .await?;

        Ok(json!({
            "id": sent["id"],
            "threadId": sent["threadId"],
            "status": "sent",
        }))
    }

    pub async fn reply_to_email(&self, args: ReplyArgs) -> Result<Value> {
        let original = self
            .metadata(&args.message_id, &["From", "To", "Subject", "Message-ID"])
            .await?;

        let message = compose_reply(
            &header(&original, "from"),
            &header(&original, "subject"),
            &header(&original, "message-id"),
            &args.body,
        );

        let sent = self
            .client
            .post(
                &format!("{}/messages/send", self.base),
                &[],
                &json!({
                    "raw": encode_raw_message(&message),
                    "threadId": original["threadId"],
                }),
            )
            .await?;

        Ok(json!({
            "id": sent["id"],
            "threadId": sent["threadId"],
            "status": "sent",
        }))
    }

    pub async fn create_draft(&self, args: ComposeArgs) -> Result<Value> {
        let raw = encode_raw_message(&compose_message(&args));
        let draft = self
            .client
            .post(
                &format!("{}/drafts", self.base),
                &[],
                &json!({ "message": { "raw": raw } }),
            )
            .await?;

        Ok(json!({
            "id": draft["id"],
            "message": draft["message"],
            "status": "draft_created",
        }))
    }

    pub async fn trash_email(&self, args: MessageIdArgs) -> Result<Value> {
        self.client
            .post_empty(&format!("{}/trash", self.message_url(&args.message_id)), &[])
            .await?;

        Ok(json!({ "id": args.message_id, "status": "trashed" }))
    }

    async fn modify_labels(&self, id: &str, add: &[&str], remove: &[&str]) -> Result<Value> {
        self.client
            .post(
                &format!("{}/modify", self.message_url(id)),
                &[],
                &json!({ "addLabelIds": add, "removeLabelIds": remove }),
            )
            .await
    }

    pub async fn mark_as_read(&self, args: MessageIdArgs) -> Result<Value> {
        self.modify_labels(&args.message_id, &[], &["UNREAD"]).await?;
        Ok(json!({ "id": args.message_id, "status": "marked_read" }))
    }

    pub async fn mark_as_unread(&self, args: MessageIdArgs) -> Result<Value> {
        self.modify_labels(&args.message_id, &["UNREAD"], &[]).await?;
        Ok(json!({ "id": args.message_id, "status": "marked_unread" }))
    }

    pub async fn list_labels(&self) -> Result<Value> {
        let response = self.client.get(&format!("{}/labels", self.base), &[]).await?;

        let labels: Vec<Value> = response["labels"]
            .as_array()
            .into_iter()
            .flatten()
            .map(|label| {
                json!({
                    "id": label["id"],
                    "name": label["name"],
                    "type": label["type"],
                })
            })
            .collect();

        Ok(json!({ "labels": labels }))
    }

    pub async fn add_label(&self, args: AddLabelArgs) -> Result<Value> {
        self.modify_labels(&args.message_id, &[args.label_id.as_str()], &[])
            .await?;

        Ok(json!({
            "id": args.message_id,
            "labelId": args.label_id,
            "status": "label_added",
        }))
    }

    pub async fn get_profile(&self) -> Result<Value> {
        let profile = self.client.get(&format!("{}/profile", self.base), &[]).await?;

        Ok(json!({
            "emailAddress": profile["emailAddress"],
            "messagesTotal": profile["messagesTotal"],
            "threadsTotal": profile["threadsTotal"],
            "historyId": profile["historyId"],
        }))
    }
}

/// Case-insensitive header lookup on a Gmail message resource
pub fn header(message: &Value, name: &str) -> String {
    message["payload"]["headers"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|h| {
            h["name"]
                .as_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|h| h["value"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Concatenated `text/plain` parts of a message payload
pub fn plain_text_body(payload: &Value) -> String {
    let parts: Vec<&Value> = match payload["parts"].as_array() {
        Some(parts) => parts.iter().collect(),
        None => vec![payload],
    };

    parts
        .into_iter()
        .filter(|part| part["mimeType"] == "text/plain")
        .filter_map(|part| part["body"]["data"].as_str())
        .filter_map(decode_base64url)
        .collect()
}

/// Decode base64url data, padded or not
fn decode_base64url(data: &str) -> Option<String> {
    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| general_purpose::URL_SAFE.decode(data))
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Encode a raw RFC 5322 message for the Gmail API (base64url, no padding)
pub fn encode_raw_message(message: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(message.as_bytes())
}

/// Encode text for a MIME header (RFC 2047) when it is not plain ASCII
pub fn encode_mime_header(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '\r' && c != '\n') {
        return text.to_string();
    }

    format!(
        "=?UTF-8?B?{}?=",
        general_purpose::STANDARD.encode(text.as_bytes())
    )
}

fn join_message(headers: Vec<String>, body: &str) -> String {
    let mut message = headers.join("\r\n");
    message.push_str("\r\n\r\n");
    message.push_str(body);
    message
}

/// Build a plain-text message
pub fn compose_message(args: &ComposeArgs) -> String {
    let mut headers = vec![format!("To: {}", args.to)];
    if let Some(cc) = args.cc.as_deref().filter(|cc| !cc.is_empty()) {
        headers.push(format!("Cc: {}", cc));
    }
    if let Some(bcc) = args.bcc.as_deref().filter(|bcc| !bcc.is_empty()) {
        headers.push(format!("Bcc: {}", bcc));
    }
    headers.push(format!("Subject: {}", encode_mime_header(&args.subject)));
    headers.push("MIME-Version: 1.0".to_string());
    headers.push("Content-Type: text/plain; charset=UTF-8".to_string());

    join_message(headers, &args.body)
}

/// Build a reply addressed to the original sender, threaded by Message-ID
pub fn compose_reply(from: &str, subject: &str, message_id: &str, body: &str) -> String {
    let subject = match subject.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("re: ") => &subject[4..],
        _ => subject,
    };

    let headers = vec![
        format!("To: {}", from),
        format!("Subject: {}", encode_mime_header(&format!("Re: {}", subject))),
        format!("In-Reply-To: {}", message_id),
        format!("References: {}", message_id),
        "MIME-Version: 1.0".to_string(),
        "Content-Type: text/plain; charset=UTF-8".to_string(),
    ];

    join_message(headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::client::test_client;
    use mockito::Matcher;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let message = json!({
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Quarterly report"},
                    {"name": "FROM", "value": "alice@example.com"}
                ]
            }
        });

        assert_eq!(header(&message, "subject"), "Quarterly report");
        assert_eq!(header(&message, "from"), "alice@example.com");
        assert_eq!(header(&message, "cc"), "");
    }

    #[test]
    fn test_plain_text_body_from_parts() {
        let payload = json!({
            "mimeType": "multipart/alternative",
            "parts": [
                {"mimeType": "text/plain", "body": {"data": encode_raw_message("Hello ")}},
                {"mimeType": "text/html", "body": {"data": encode_raw_message("<b>ignored</b>")}},
                {"mimeType": "text/plain", "body": {"data": encode_raw_message("world")}}
            ]
        });

        assert_eq!(plain_text_body(&payload), "Hello world");
    }

    #[test]
    fn test_plain_text_body_single_part() {
        let payload = json!({
            "mimeType": "text/plain",
            "body": {"data": "SGk_"}
        });
        assert_eq!(plain_text_body(&payload), "Hi?");
    }

    #[test]
    fn test_compose_message_skips_empty_optional_headers() {
        let args = ComposeArgs {
            to: "bob@example.com".to_string(),
            subject: "Lunch".to_string(),
            body: "Noon?".to_string(),
            cc: Some("carol@example.com".to_string()),
            bcc: Some(String::new()),
        };

        let message = compose_message(&args);
        assert!(message.starts_with("To: bob@example.com\r\nCc: carol@example.com\r\n"));
        assert!(!message.contains("Bcc:"));
        assert!(message.contains("Subject: Lunch\r\n"));
        assert!(message.ends_with("\r\n\r\nNoon?"));
    }

    #[test]
    fn test_compose_reply_does_not_stack_prefix() {
        let reply = compose_reply("alice@example.com", "RE: Plans", "<abc@mail>", "Sounds good");

        assert!(reply.contains("To: alice@example.com"));
        assert!(reply.contains("Subject: Re: Plans\r\n"));
        assert!(reply.contains("In-Reply-To: <abc@mail>"));
        assert!(reply.contains("References: <abc@mail>"));
    }

    #[test]
    fn test_encode_mime_header() {
        assert_eq!(encode_mime_header("Hello"), "Hello");
        assert!(encode_mime_header("Héllo").starts_with("=?UTF-8?B?"));
    }

    #[test]
    fn test_raw_message_has_no_padding() {
        let encoded = encode_raw_message("a");
        assert_eq!(encoded, "YQ");
    }

    #[tokio::test]
    async fn test_search_emails_fetches_metadata_per_message() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "from:alice".into()),
                Matcher::UrlEncoded("maxResults".into(), "10".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"messages": [{"id": "m1", "threadId": "t1"}, {"id": "m2", "threadId": "t2"}]})
                    .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let mut details = Vec::new();
        for (id, subject) in [("m1", "Lunch"), ("m2", "Re: Lunch")] {
            details.push(
                server
                    .mock("GET", format!("/gmail/v1/users/me/messages/{}", id).as_str())
                    .match_query(Matcher::UrlEncoded("format".into(), "metadata".into()))
                    .with_status(200)
                    .with_header("content-type", "application/json")
                    .with_body(
                        json!({
                            "id": id,
                            "snippet": "See you at noon",
                            "payload": {"headers": [
                                {"name": "From", "value": "alice@example.com"},
                                {"name": "Subject", "value": subject}
                            ]}
                        })
                        .to_string(),
                    )
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let client = test_client(&server.url());
        let result = client
            .gmail()
            .search_emails(SearchEmailsArgs {
                query: "from:alice".to_string(),
                max_results: None,
            })
            .await
            .unwrap();

        assert_eq!(result["count"], 2);
        assert_eq!(result["messages"][0]["from"], "alice@example.com");
        assert_eq!(result["messages"][0]["subject"], "Lunch");
        assert_eq!(result["messages"][1]["subject"], "Re: Lunch");
        assert_eq!(result["messages"][1]["threadId"], "t2");
        assert_eq!(result["messages"][1]["to"], "");

        list.assert_async().await;
        for mock in details {
            mock.assert_async().await;
        }
    }
}
