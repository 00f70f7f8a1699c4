//! Calendar tools: calendars, events, free/busy and quick add

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::client::{segment, WorkspaceClient};
use crate::error::Result;

const PRIMARY: &str = "primary";

fn primary() -> String {
    PRIMARY.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsArgs {
    #[serde(default = "primary")]
    pub calendar_id: String,
    pub max_results: Option<u32>,
    pub time_min: Option<String>,
    pub time_max: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRefArgs {
    #[serde(default = "primary")]
    pub calendar_id: String,
    pub event_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventArgs {
    #[serde(default = "primary")]
    pub calendar_id: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: String,
    pub end: String,
    pub attendees: Option<Vec<String>>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventArgs {
    #[serde(default = "primary")]
    pub calendar_id: String,
    pub event_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub attendees: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindFreeTimeArgs {
    pub time_min: String,
    pub time_max: String,
    pub calendars: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickAddArgs {
    #[serde(default = "primary")]
    pub calendar_id: String,
    pub text: String,
}

/// Calendar API v3
pub struct Calendar<'a> {
    client: &'a WorkspaceClient,
    base: &'a str,
}

impl<'a> Calendar<'a> {
    pub(super) fn new(client: &'a WorkspaceClient) -> Self {
        Self {
            client,
            base: &client.apis().calendar,
        }
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.base, segment(calendar_id))
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> String {
        format!("{}/{}", self.events_url(calendar_id), segment(event_id))
    }

    pub async fn list_calendars(&self) -> Result<Value> {
        let response = self
            .client
            .get(&format!("{}/users/me/calendarList", self.base), &[])
            .await?;

        let calendars: Vec<Value> = items(&response)
            .map(|cal| {
                json!({
                    "id": cal["id"],
                    "summary": cal["summary"],
                    "primary": cal["primary"],
                    "timeZone": cal["timeZone"],
                    "accessRole": cal["accessRole"],
                })
            })
            .collect();

        Ok(json!({ "calendars": calendars }))
    }

    pub async fn list_events(&self, args: ListEventsArgs) -> Result<Value> {
        let mut query = vec![
            ("maxResults", args.max_results.unwrap_or(10).to_string()),
            (
                "timeMin",
                args.time_min.unwrap_or_else(|| Utc::now().to_rfc3339()),
            ),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(time_max) = args.time_max {
            query.push(("timeMax", time_max));
        }

        let response = self
            .client
            .get(&self.events_url(&args.calendar_id), &query)
            .await?;

        let events: Vec<Value> = items(&response)
            .map(|event| {
                json!({
                    "id": event["id"],
                    "summary": event["summary"],
                    "description": event["description"],
                    "location": event["location"],
                    "start": event_time(&event["start"]),
                    "end": event_time(&event["end"]),
                    "attendees": attendees(event, &["email", "responseStatus"]),
                    "htmlLink": event["htmlLink"],
                })
            })
            .collect();

        Ok(json!({ "events": events }))
    }

    pub async fn get_event(&self, args: EventRefArgs) -> Result<Value> {
        let event = self
            .client
            .get(&self.event_url(&args.calendar_id, &args.event_id), &[])
            .await?;

        Ok(json!({
            "id": event["id"],
            "summary": event["summary"],
            "description": event["description"],
            "location": event["location"],
            "start": event_time(&event["start"]),
            "end": event_time(&event["end"]),
            "timeZone": event["start"]["timeZone"],
            "attendees": attendees(&event, &["email", "displayName", "responseStatus", "organizer"]),
            "organizer": event["organizer"],
            "htmlLink": event["htmlLink"],
            "hangoutLink": event["hangoutLink"],
            "recurringEventId": event["recurringEventId"],
        }))
    }

    pub async fn create_event(&self, args: CreateEventArgs) -> Result<Value> {
        let mut body = json!({
            "summary": args.summary,
            "start": { "dateTime": args.start },
            "end": { "dateTime": args.end },
        });
        if let Some(description) = args.description {
            body["description"] = json!(description);
        }
        if let Some(location) = args.location {
            body["location"] = json!(location);
        }
        if let Some(time_zone) = args.time_zone {
            body["start"]["timeZone"] = json!(time_zone);
            body["end"]["timeZone"] = json!(time_zone);
        }
        if let Some(emails) = args.attendees {
            body["attendees"] = attendee_list(emails);
        }

        let event = self
            .client
            .post(&self.events_url(&args.calendar_id), &[], &body)
            .await?;

        Ok(json!({
            "id": event["id"],
            "summary": event["summary"],
            "start": event["start"]["dateTime"],
            "end": event["end"]["dateTime"],
            "htmlLink": event["htmlLink"],
            "status": "created",
        }))
    }

    pub async fn update_event(&self, args: UpdateEventArgs) -> Result<Value> {
        let url = self.event_url(&args.calendar_id, &args.event_id);
        let mut event = self.client.get(&url, &[]).await?;

        if let Some(summary) = args.summary.filter(|s| !s.is_empty()) {
            event["summary"] = json!(summary);
        }
        if let Some(description) = args.description {
            event["description"] = json!(description);
        }
        if let Some(location) = args.location {
            event["location"] = json!(location);
        }
        if let Some(start) = args.start.filter(|s| !s.is_empty()) {
            event["start"] = json!({ "dateTime": start });
        }
        if let Some(end) = args.end.filter(|s| !s.is_empty()) {
            event["end"] = json!({ "dateTime": end });
        }
        if let Some(emails) = args.attendees {
            event["attendees"] = attendee_list(emails);
        }

        let updated = self.client.put(&url, &[], &event).await?;

        Ok(json!({
            "id": updated["id"],
            "summary": updated["summary"],
            "start": updated["start"]["dateTime"],
            "end": updated["end"]["dateTime"],
            "status": "updated",
        }))
    }

    pub async fn delete_event(&self, args: EventRefArgs) -> Result<Value> {
        self.client
            .delete(&self.event_url(&args.calendar_id, &args.event_id), &[])
            .await?;

        Ok(json!({ "id": args.event_id, "status": "deleted" }))
    }

    pub async fn find_free_time(&self, args: FindFreeTimeArgs) -> Result<Value> {
        let calendars = args.calendars.unwrap_or_else(|| vec![primary()]);
        let items: Vec<Value> = calendars.iter().map(|id| json!({ "id": id })).collect();

        let response = self
            .client
            .post(
                &format!("{}/freeBusy", self.base),
                &[],
                &json!({
                    "timeMin": args.time_min,
                    "timeMax": args.time_max,
                    "items": items,
                }),
            )
            .await?;

        let calendars: Vec<Value> = response["calendars"]
            .as_object()
            .into_iter()
            .flatten()
            .map(|(id, data)| {
                let busy: Vec<Value> = data["busy"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|slot| json!({ "start": slot["start"], "end": slot["end"] }))
                    .collect();

                json!({
                    "calendarId": id,
                    "busy": busy,
                    "errors": data["errors"],
                })
            })
            .collect();

        Ok(json!({
            "timeMin": args.time_min,
            "timeMax": args.time_max,
            "calendars": calendars,
        }))
    }

    pub async fn quick_add_event(&self, args: QuickAddArgs) -> Result<Value> {
        let event = self
            .client
            .post_empty(
                &format!("{}/quickAdd", self.events_url(&args.calendar_id)),
                &[("text", args.text)],
            )
            .await?;

        Ok(json!({
            "id": event["id"],
            "summary": event["summary"],
            "start": event_time(&event["start"]),
            "end": event_time(&event["end"]),
            "htmlLink": event["htmlLink"],
            "status": "created",
        }))
    }
}

fn items(response: &Value) -> impl Iterator<Item = &Value> {
    response["items"].as_array().into_iter().flatten()
}

/// `dateTime` for timed events, `date` for all-day ones
fn event_time(time: &Value) -> Value {
    match &time["dateTime"] {
        Value::Null => time["date"].clone(),
        date_time => date_time.clone(),
    }
}

fn attendees(event: &Value, fields: &[&str]) -> Value {
    match event["attendees"].as_array() {
        Some(list) => list
            .iter()
            .map(|a| {
                fields
                    .iter()
                    .map(|f| (f.to_string(), a[*f].clone()))
                    .collect::<serde_json::Map<_, _>>()
                    .into()
            })
            .collect::<Vec<Value>>()
            .into(),
        None => Value::Null,
    }
}

fn attendee_list(emails: Vec<String>) -> Value {
    emails
        .into_iter()
        .map(|email| json!({ "email": email }))
        .collect::<Vec<_>>()
        .into()
}
