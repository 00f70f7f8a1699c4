//! Slides tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{segment, WorkspaceClient};
use crate::error::Result;

const DEFAULT_LAYOUT: &str = "TITLE_AND_BODY";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationIdArgs {
    pub presentation_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresentationArgs {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlideArgs {
    pub presentation_id: String,
    pub layout: Option<String>,
}

/// Slides API v1
pub struct Slides<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> Slides<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().slides,
        }
    }

    fn presentation_url(&self, presentation_id: &str) -> String {
        format!("{}/presentations/{}", self.base, segment(presentation_id))
    }

    pub async fn get_presentation(&self, args: PresentationIdArgs) -> Result<Value> {
        let presentation = self
            .client
            .get(&self.presentation_url(&args.presentation_id), &[])
            .await?;

        let slides: Vec<Value> = presentation["slides"]
            .as_array()
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(index, slide)| {
                json!({
                    "index": index,
                    "objectId": slide["objectId"],
                    "elementCount": slide["pageElements"].as_array().map_or(0, Vec::len),
                })
            })
            .collect();

        Ok(json!({
            "presentationId": presentation["presentationId"],
            "title": presentation["title"],
            "slideCount": slides.len(),
            "slides": slides,
        }))
    }

    pub async fn create_presentation(&self, args: CreatePresentationArgs) -> Result<Value> {
        let presentation = self
            .client
            .post(
                &format!("{}/presentations", self.base),
                &[],
                &json!({ "title": args.title }),
            )
            .await?;

        Ok(json!({
            "presentationId": presentation["presentationId"],
            "title": presentation["title"],
            "status": "created",
        }))
    }

    pub async fn create_slide(&self, args: CreateSlideArgs) -> Result<Value> {
        let layout = args.layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

        let response = self
            .client
            .post(
                &format!(
                    "{}:batchUpdate",
                    self.presentation_url(&args.presentation_id)
                ),
                &[],
                &create_slide_request(&layout),
            )
            .await?;

        Ok(json!({
            "presentationId": args.presentation_id,
            "replies": response["replies"],
            "status": "slide_created",
        }))
    }
}

fn create_slide_request(layout: &str) -> Value {
    json!({
        "requests": [{
            "createSlide": {
                "slideLayoutReference": { "predefinedLayout": layout }
            }
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::client::test_client;

    #[test]
    fn test_create_slide_request() {
        let request = create_slide_request("BLANK");
        assert_eq!(
            request["requests"][0]["createSlide"]["slideLayoutReference"]["predefinedLayout"],
            "BLANK"
        );
    }

    #[test]
    fn test_layout_is_optional() {
        let args: CreateSlideArgs =
            serde_json::from_value(json!({"presentationId": "p1"})).unwrap();
        assert!(args.layout.is_none());
    }

    #[tokio::test]
    async fn test_create_presentation() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/presentations")
            .match_body(mockito::Matcher::Json(json!({"title": "Roadmap"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"presentationId": "p1", "title": "Roadmap"}).to_string())
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client
            .slides()
            .create_presentation(CreatePresentationArgs {
                title: "Roadmap".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result["presentationId"], "p1");
        assert_eq!(result["status"], "created");
        mock.assert_async().await;
    }
}
