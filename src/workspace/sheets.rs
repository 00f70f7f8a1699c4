//! Sheets tools

use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{segment, WorkspaceClient};
use crate::error::Result;

/// How Sheets interprets written cell values
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    Raw,
    #[default]
    UserEntered,
}

impl ValueInputOption {
    fn as_str(self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRangeArgs {
    pub spreadsheet_id: String,
    pub range: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteValuesArgs {
    pub spreadsheet_id: String,
    pub range: String,
    pub values: Vec<Vec<Value>>,
    #[serde(default)]
    pub value_input_option: ValueInputOption,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpreadsheetArgs {
    pub title: String,
    pub sheet_title: Option<String>,
}

/// Sheets API v4
pub struct Sheets<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> Sheets<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().sheets,
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base,
            segment(spreadsheet_id),
            segment(range)
        )
    }

    pub async fn get_sheet_values(&self, args: SheetRangeArgs) -> Result<Value> {
        let response = self
            .client
            .get(&self.values_url(&args.spreadsheet_id, &args.range), &[])
            .await?;

        Ok(json!({
            "range": response["range"],
            "majorDimension": response["majorDimension"],
            "values": values_or_empty(&response["values"]),
        }))
    }

    pub async fn update_sheet_values(&self, args: WriteValuesArgs) -> Result<Value> {
        let response = self
            .client
            .put(
                &self.values_url(&args.spreadsheet_id, &args.range),
                &[(
                    "valueInputOption",
                    args.value_input_option.as_str().to_string(),
                )],
                &json!({ "values": args.values }),
            )
            .await?;

        Ok(json!({
            "updatedRange": response["updatedRange"],
            "updatedRows": response["updatedRows"],
            "updatedColumns": response["updatedColumns"],
            "updatedCells": response["updatedCells"],
        }))
    }

    pub async fn append_sheet_values(&self, args: WriteValuesArgs) -> Result<Value> {
        let response = self
            .client
            .post(
                &format!(
                    "{}:append",
                    self.values_url(&args.spreadsheet_id, &args.range)
                ),
                &[(
                    "valueInputOption",
                    args.value_input_option.as_str().to_string(),
                )],
                &json!({ "values": args.values }),
            )
            .await?;

        Ok(json!({
            "tableRange": response["tableRange"],
            "updates": response["updates"],
        }))
    }

    pub async fn create_spreadsheet(&self, args: CreateSpreadsheetArgs) -> Result<Value> {
        let sheet_title = args.sheet_title.unwrap_or_else(|| "Sheet1".to_string());

        let response = self
            .client
            .post(
                &format!("{}/spreadsheets", self.base),
                &[],
                &json!({
                    "properties": { "title": args.title },
                    "sheets": [{ "properties": { "title": sheet_title } }],
                }),
            )
            .await?;

        Ok(json!({
            "spreadsheetId": response["spreadsheetId"],
            "spreadsheetUrl": response["spreadsheetUrl"],
            "title": response["properties"]["title"],
        }))
    }
}

fn values_or_empty(values: &Value) -> Value {
    match values {
        Value::Null => json!([]),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::client::test_client;
    use mockito::Matcher;

    #[test]
    fn test_value_input_option_default() {
        let args: WriteValuesArgs = serde_json::from_value(json!({
            "spreadsheetId": "s1",
            "range": "Sheet1!A1:B2",
            "values": [["a", 1], [true, "b"]]
        }))
        .unwrap();
        assert_eq!(args.value_input_option, ValueInputOption::UserEntered);
        assert_eq!(args.values[1][0], json!(true));

        let args: WriteValuesArgs = serde_json::from_value(json!({
            "spreadsheetId": "s1",
            "range": "A1",
            "values": [],
            "valueInputOption": "RAW"
        }))
        .unwrap();
        assert_eq!(args.value_input_option.as_str(), "RAW");
    }

    #[test]
    fn test_missing_values_become_empty() {
        assert_eq!(values_or_empty(&Value::Null), json!([]));
        assert_eq!(values_or_empty(&json!([["x"]])), json!([["x"]]));
    }

    #[tokio::test]
    async fn test_update_values_defaults_to_user_entered() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "PUT",
                Matcher::Regex(r"^/v4/spreadsheets/s1/values/Sheet1(!|%21)A1(:|%3A)B2$".to_string()),
            )
            .match_query(Matcher::UrlEncoded(
                "valueInputOption".into(),
                "USER_ENTERED".into(),
            ))
            .match_body(Matcher::Json(json!({"values": [["a", 1]]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"updatedRange": "Sheet1!A1:B1", "updatedCells": 2}).to_string())
            .create_async()
            .await;

        let client = test_client(&server.url());
        let args: WriteValuesArgs = serde_json::from_value(json!({
            "spreadsheetId": "s1",
            "range": "Sheet1!A1:B2",
            "values": [["a", 1]]
        }))
        .unwrap();
        let result = client.sheets().update_sheet_values(args).await.unwrap();

        assert_eq!(result["updatedCells"], 2);
        assert_eq!(result["updatedRange"], "Sheet1!A1:B1");
        mock.assert_async().await;
    }
}
