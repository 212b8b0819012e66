//! HTTP client for the work-management backend.

pub mod protocol;

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::WorknestConfig;
use crate::error::{WorknestError, WorknestResult};
use crate::event::format_date;
use protocol::{ErrorResponse, EventDetail, EventPayload, GuestPatch, UserRecord, decode};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    access_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> WorknestResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WorknestError::Config(format!("Invalid base_url '{base_url}': {e}")))?;

        if base_url.cannot_be_a_base() {
            return Err(WorknestError::Config(format!(
                "base_url '{base_url}' cannot hold a path"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorknestError::Config(format!("Could not build HTTP client: {e}")))?;

        Ok(ApiClient {
            http,
            base_url,
            access_token: None,
        })
    }

    pub fn from_config(config: &WorknestConfig) -> WorknestResult<Self> {
        let client = Self::new(&config.base_url, config.request_timeout())?;
        Ok(match &config.access_token {
            Some(token) => client.with_access_token(token.clone()),
            None => client,
        })
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint(&self, segments: &[&str]) -> WorknestResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WorknestError::Config("base_url cannot hold a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return its JSON body (`Null` when empty) with any
    /// success envelope removed. Non-2xx statuses become `Http` errors.
    async fn send(&self, builder: RequestBuilder) -> WorknestResult<Value> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();
        debug!(%method, %url, %status, "received response");

        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&body)
                .ok()
                .and_then(ErrorResponse::reason)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(WorknestError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| WorknestError::Decode(e.to_string()))?;
        protocol::unwrap_envelope(value)
    }

    async fn send_json<B: Serialize>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> WorknestResult<Value> {
        self.send(self.request(method, url).json(body)).await
    }

    /// GET /organizations/:org/users
    pub async fn list_users(&self, organization_id: &str) -> WorknestResult<Vec<UserRecord>> {
        let url = self.endpoint(&["organizations", organization_id, "users"])?;
        let value = self.send(self.request(Method::GET, url)).await?;
        decode(take_list(value, "users"))
    }

    /// GET /organizations/:org/events/:id
    pub async fn event_detail(
        &self,
        organization_id: &str,
        event_id: &str,
    ) -> WorknestResult<EventDetail> {
        let url = self.endpoint(&["organizations", organization_id, "events", event_id])?;
        let value = self.send(self.request(Method::GET, url)).await?;
        decode(take_record(value, "event"))
    }

    /// GET /organizations/:org/events?start_date=..&end_date=..
    pub async fn list_events(
        &self,
        organization_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> WorknestResult<Vec<EventDetail>> {
        let url = self.endpoint(&["organizations", organization_id, "events"])?;
        let builder = self
            .request(Method::GET, url)
            .query(&[("start_date", format_date(from)), ("end_date", format_date(to))]);
        let value = self.send(builder).await?;
        decode(take_list(value, "events"))
    }

    /// POST /organizations/:org/events
    ///
    /// Returns the id the server assigned.
    pub async fn create_event(
        &self,
        organization_id: &str,
        payload: &EventPayload,
    ) -> WorknestResult<String> {
        let url = self.endpoint(&["organizations", organization_id, "events"])?;
        let value = self.send_json(Method::POST, url, payload).await?;
        let created: EventDetail = decode(take_record(value, "event"))?;

        created
            .event_id
            .ok_or_else(|| WorknestError::Decode("create response carried no event id".into()))
    }

    /// PUT /organizations/:org/events/:id
    pub async fn update_event(
        &self,
        organization_id: &str,
        event_id: &str,
        payload: &EventPayload,
    ) -> WorknestResult<()> {
        let url = self.endpoint(&["organizations", organization_id, "events", event_id])?;
        self.send_json(Method::PUT, url, payload).await?;
        Ok(())
    }

    /// PATCH /organizations/:org/events/:id with only the guest field.
    pub async fn patch_event_guests(
        &self,
        organization_id: &str,
        event_id: &str,
        patch: &GuestPatch,
    ) -> WorknestResult<()> {
        let url = self.endpoint(&["organizations", organization_id, "events", event_id])?;
        self.send_json(Method::PATCH, url, patch).await?;
        Ok(())
    }
}

/// Lists arrive bare or nested under a named key.
fn take_list(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_array) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        Value::Null => Value::Array(Vec::new()),
        other => other,
    }
}

fn take_record(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventType, Visibility};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
    }

    fn payload() -> EventPayload {
        EventPayload {
            title: "Sprint Review".into(),
            description: String::new(),
            location: String::new(),
            all_day: false,
            start_time: "2024-05-01T10:00:00".into(),
            end_time: "2024-05-01T11:00:00".into(),
            start_date: "2024-05-01T10:00:00".into(),
            end_date: "2024-05-01T11:00:00".into(),
            event_type: EventType::Internal,
            internal_guest_ids: vec!["7".into()],
            external_contacts: vec![],
            notification_minutes: 15,
            visibility: Visibility::Public,
            guests_allowed: true,
            organization_id: "acme".into(),
            user_id: None,
            event_id: None,
        }
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(WorknestError::Config(_))
        ));
    }

    #[tokio::test]
    async fn list_users_accepts_nested_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organizations/acme/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "users": [{ "id": 1, "username": "ana" }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let users = client(&server).list_users("acme").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "1");
    }

    #[tokio::test]
    async fn create_event_returns_assigned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/organizations/acme/events"))
            .and(body_json(serde_json::to_value(payload()).unwrap()))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 55 })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).create_event("acme", &payload()).await.unwrap();
        assert_eq!(id, "55");
    }

    #[tokio::test]
    async fn create_response_with_both_id_keys_returns_the_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/organizations/acme/events"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({ "id": 55, "event_id": 55 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).create_event("acme", &payload()).await.unwrap();
        assert_eq!(id, "55");
    }

    #[tokio::test]
    async fn create_without_id_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "title": "x" })))
            .mount(&server)
            .await;

        let result = client(&server).create_event("acme", &payload()).await;
        assert!(matches!(result, Err(WorknestError::Decode(_))));
    }

    #[tokio::test]
    async fn server_errors_carry_status_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(503).set_body_json(json!({ "error": "maintenance" })),
            )
            .mount(&server)
            .await;

        let err = client(&server).event_detail("acme", "e1").await.unwrap_err();
        assert!(err.is_server_error());
        match err {
            WorknestError::Http { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_accepts_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/organizations/acme/events/e1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .update_event("acme", "e1", &payload())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn patch_sends_only_guest_field() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/organizations/acme/events/e1"))
            .and(body_json(json!({ "internal_guest_ids": ["7", "12"] })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let patch = GuestPatch {
            internal_guest_ids: vec!["7".into(), "12".into()],
        };
        client(&server)
            .patch_event_guests("acme", "e1", &patch)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn list_events_sends_date_range_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organizations/acme/events"))
            .and(query_param("start_date", "2024-05-01"))
            .and(query_param("end_date", "2024-05-31"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "events": [{ "event_id": "e1", "title": "Planning" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let events = client(&server)
            .with_access_token("secret")
            .list_events(
                "acme",
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Planning");
    }

    #[tokio::test]
    async fn unsuccessful_envelope_with_200_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "organization disabled"
            })))
            .mount(&server)
            .await;

        let err = client(&server).list_users("acme").await.unwrap_err();
        assert!(matches!(err, WorknestError::Rejected(_)));
    }
}
