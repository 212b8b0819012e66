//! JSON shapes exchanged with the work-management backend.
//!
//! Field names are snake_case on the wire and must stay exactly as they are.
//! The backend is loose about id types (`7` and `"7"` both occur), so every
//! id is normalized to a `String` on the way in.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{WorknestError, WorknestResult};
use crate::event::{EventType, ExternalContact, Visibility};

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    WireId::deserialize(d).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<WireId>::deserialize(d)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}

fn id_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<WireId>>::deserialize(d)?
        .unwrap_or_default()
        .into_iter()
        .map(String::from)
        .collect())
}

pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Strip the optional `{ "success": .., "data": .. }` wrapper some endpoints use.
pub fn unwrap_envelope(value: Value) -> WorknestResult<Value> {
    match value {
        Value::Object(mut map) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                let reason = map
                    .get("error")
                    .or_else(|| map.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("request was not successful")
                    .to_string();
                return Err(WorknestError::Rejected(reason));
            }
            match map.remove("data") {
                Some(data) => Ok(data),
                None => Ok(Value::Object(map)),
            }
        }
        other => Ok(other),
    }
}

pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> WorknestResult<T> {
    serde_json::from_value(unwrap_envelope(value)?).map_err(|e| WorknestError::Decode(e.to_string()))
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn reason(self) -> Option<String> {
        self.error.or(self.message).or(self.detail)
    }
}

// ============================================================================
// Directory
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "WireUserRecord")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub departments: Vec<DepartmentMembership>,
}

/// The display name arrives as `full_name`, `fullName` or `name`, and some
/// records carry more than one of them.
#[derive(Deserialize)]
struct WireUserRecord {
    #[serde(deserialize_with = "id")]
    id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    full_name: String,
    #[serde(default, rename = "fullName", deserialize_with = "null_as_default")]
    full_name_camel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    departments: Vec<DepartmentMembership>,
}

impl From<WireUserRecord> for UserRecord {
    fn from(wire: WireUserRecord) -> Self {
        let full_name = [wire.full_name, wire.full_name_camel, wire.name]
            .into_iter()
            .find(|n| !n.trim().is_empty())
            .unwrap_or_default();

        UserRecord {
            id: wire.id,
            username: wire.username,
            full_name,
            departments: wire.departments,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DepartmentMembership {
    #[serde(default, deserialize_with = "optional_id")]
    pub department_id: Option<String>,
    #[serde(default)]
    pub department_name: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub sub_department_id: Option<String>,
    #[serde(default)]
    pub sub_department_name: Option<String>,
}

// ============================================================================
// Events
// ============================================================================

/// An event as the backend reports it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "WireEventDetail")]
pub struct EventDetail {
    pub event_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_type: Option<EventType>,
    pub internal_guest_ids: Vec<String>,
    pub external_contacts: Vec<ExternalContact>,
    pub notification_minutes: Option<u32>,
    pub visibility: Option<Visibility>,
    pub guests_allowed: Option<bool>,
    pub organization_id: Option<String>,
}

#[derive(Deserialize)]
struct WireEventDetail {
    #[serde(default, deserialize_with = "optional_id")]
    event_id: Option<String>,
    /// Older endpoints name the id `id`; some send both.
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    all_day: bool,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    event_type: Option<EventType>,
    #[serde(default, deserialize_with = "id_list")]
    internal_guest_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    external_contacts: Vec<ExternalContact>,
    #[serde(default)]
    notification_minutes: Option<u32>,
    #[serde(default)]
    visibility: Option<Visibility>,
    #[serde(default)]
    guests_allowed: Option<bool>,
    #[serde(default, deserialize_with = "optional_id")]
    organization_id: Option<String>,
}

impl From<WireEventDetail> for EventDetail {
    fn from(wire: WireEventDetail) -> Self {
        EventDetail {
            event_id: wire.event_id.or(wire.id),
            title: wire.title,
            description: wire.description,
            location: wire.location,
            all_day: wire.all_day,
            start_time: wire.start_time,
            end_time: wire.end_time,
            start_date: wire.start_date,
            end_date: wire.end_date,
            event_type: wire.event_type,
            internal_guest_ids: wire.internal_guest_ids,
            external_contacts: wire.external_contacts,
            notification_minutes: wire.notification_minutes,
            visibility: wire.visibility,
            guests_allowed: wire.guests_allowed,
            organization_id: wire.organization_id,
        }
    }
}

/// Body of create (POST) and full update (PUT).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub location: String,
    pub all_day: bool,
    pub start_time: String,
    pub end_time: String,
    pub start_date: String,
    pub end_date: String,
    pub event_type: EventType,
    pub internal_guest_ids: Vec<String>,
    pub external_contacts: Vec<ExternalContact>,
    pub notification_minutes: u32,
    pub visibility: Visibility,
    pub guests_allowed: bool,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// Body of the compensating update: the guest field and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestPatch {
    pub internal_guest_ids: Vec<String>,
}
