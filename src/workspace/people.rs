//! Contacts tools backed by the People API

use serde::Deserialize;
use serde_json::{json, Value};

use super::client::WorkspaceClient;
use crate::error::Result;

const CONTACT_FIELDS: &str = "names,emailAddresses,phoneNumbers,organizations";
const CONTACT_DETAIL_FIELDS: &str = "names,emailAddresses,phoneNumbers,organizations,biographies";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContactsArgs {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchContactsArgs {
    pub query: String,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactArgs {
    pub given_name: String,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRefArgs {
    pub resource_name: String,
}

/// People API v1
pub struct People<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> People<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().people,
        }
    }

    pub async fn list_contacts(&self, args: ListContactsArgs) -> Result<Value> {
        let mut query = vec![
            ("pageSize", args.page_size.unwrap_or(50).to_string()),
            ("personFields", CONTACT_FIELDS.to_string()),
        ];
        if let Some(token) = args.page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .get(&format!("{}/people/me/connections", self.base), &query)
            .await?;

        let contacts = match response["connections"].as_array() {
            Some(people) => people
                .iter()
                .map(|person| {
                    json!({
                        "resourceName": person["resourceName"],
                        "etag": person["etag"],
                        "names": pluck(person, "names", "displayName"),
                        "emailAddresses": pluck(person, "emailAddresses", "value"),
                        "phoneNumbers": pluck(person, "phoneNumbers", "value"),
                        "organizations": pluck(person, "organizations", "name"),
                    })
                })
                .collect(),
            None => Value::Null,
        };

        Ok(json!({
            "nextPageToken": response["nextPageToken"],
            "totalPeople": response["totalPeople"],
            "totalItems": response["totalItems"],
            "contacts": contacts,
        }))
    }

    pub async fn search_contacts(&self, args: SearchContactsArgs) -> Result<Value> {
        let response = self
            .client
            .get(
                &format!("{}/people:searchContacts", self.base),
                &[
                    ("query", args.query),
                    ("pageSize", args.page_size.unwrap_or(20).to_string()),
                    ("readMask", CONTACT_FIELDS.to_string()),
                ],
            )
            .await?;

        let results = match response["results"].as_array() {
            Some(results) => results
                .iter()
                .map(|result| {
                    let person = &result["person"];
                    json!({
                        "resourceName": person["resourceName"],
                        "names": pluck(person, "names", "displayName"),
                        "emailAddresses": pluck(person, "emailAddresses", "value"),
                        "phoneNumbers": pluck(person, "phoneNumbers", "value"),
                    })
                })
                .collect(),
            None => Value::Null,
        };

        Ok(json!({ "results": results }))
    }

    pub async fn create_contact(&self, args: CreateContactArgs) -> Result<Value> {
        let response = self
            .client
            .post(
                &format!("{}/people:createContact", self.base),
                &[],
                &contact_body(&args),
            )
            .await?;

        Ok(json!({
            "resourceName": response["resourceName"],
            "etag": response["etag"],
            "status": "created",
        }))
    }

    pub async fn get_contact(&self, args: ContactRefArgs) -> Result<Value> {
        // resourceName is a path like "people/c123", so it is not percent-encoded
        let person = self
            .client
            .get(
                &format!("{}/{}", self.base, args.resource_name.trim_start_matches('/')),
                &[("personFields", CONTACT_DETAIL_FIELDS.to_string())],
            )
            .await?;

        Ok(json!({
            "resourceName": person["resourceName"],
            "etag": person["etag"],
            "names": pluck(&person, "names", "displayName"),
            "emailAddresses": pluck(&person, "emailAddresses", "value"),
            "phoneNumbers": pluck(&person, "phoneNumbers", "value"),
            "organizations": pluck(&person, "organizations", "name"),
        }))
    }
}

/// Collect `field` from every entry of the `list` array, or null when the list is absent
fn pluck(person: &Value, list: &str, field: &str) -> Value {
    match person[list].as_array() {
        Some(entries) => entries.iter().map(|e| e[field].clone()).collect(),
        None => Value::Null,
    }
}

fn contact_body(args: &CreateContactArgs) -> Value {
    let mut name = json!({ "givenName": args.given_name });
    if let Some(family_name) = &args.family_name {
        name["familyName"] = json!(family_name);
    }

    let mut body = json!({ "names": [name] });
    if let Some(email) = &args.email {
        body["emailAddresses"] = json!([{ "value": email }]);
    }
    if let Some(phone) = &args.phone {
        body["phoneNumbers"] = json!([{ "value": phone }]);
    }
    if let Some(company) = &args.company {
        body["organizations"] = json!([{ "name": company }]);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::client::test_client;
    use mockito::Matcher;

    #[test]
    fn test_pluck() {
        let person = json!({
            "names": [{"displayName": "Ada Lovelace", "givenName": "Ada"}],
            "emailAddresses": [{"value": "ada@example.com"}, {"value": "ada@work.example"}]
        });

        assert_eq!(pluck(&person, "names", "displayName"), json!(["Ada Lovelace"]));
        assert_eq!(
            pluck(&person, "emailAddresses", "value"),
            json!(["ada@example.com", "ada@work.example"])
        );
        assert_eq!(pluck(&person, "phoneNumbers", "value"), Value::Null);
    }

    #[test]
    fn test_contact_body_omits_missing_fields() {
        let args: CreateContactArgs =
            serde_json::from_value(json!({"givenName": "Ada", "email": "ada@example.com"}))
                .unwrap();

        assert_eq!(
            contact_body(&args),
            json!({
                "names": [{"givenName": "Ada"}],
                "emailAddresses": [{"value": "ada@example.com"}]
            })
        );
    }

    #[tokio::test]
    async fn test_list_contacts_default_page_size() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/people/me/connections")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pageSize".into(), "50".into()),
                Matcher::Regex("personFields=".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "connections": [{
                        "resourceName": "people/c1",
                        "names": [{"displayName": "Ada Lovelace"}],
                        "emailAddresses": [{"value": "ada@example.com"}]
                    }],
                    "totalPeople": 1
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let args: ListContactsArgs = serde_json::from_value(json!({})).unwrap();
        let result = client.people().list_contacts(args).await.unwrap();

        assert_eq!(result["totalPeople"], 1);
        assert_eq!(result["contacts"][0]["resourceName"], "people/c1");
        mock.assert_async().await;
    }
}
