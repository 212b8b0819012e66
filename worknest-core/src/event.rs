//! The event being created or edited, and its conversion to the wire payload.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::api::protocol::{EventDetail, EventPayload};
use crate::constants::DEFAULT_NOTIFICATION_MINUTES;
use crate::error::{WorknestError, WorknestResult};
use crate::identity::OrganizationContext;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Which participant model the event uses. Only one is ever sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Directory members, referenced by user id.
    #[default]
    Internal,
    /// Free-form contacts, never resolved against the directory.
    External,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalContact {
    #[serde(default, deserialize_with = "crate::api::protocol::null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "crate::api::protocol::null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "crate::api::protocol::null_as_default")]
    pub phone: String,
}

impl ExternalContact {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        ExternalContact {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }
}

/// The wizard's working copy of an event.
///
/// Time fields are ignored while `all_day` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    /// Present once the event exists on the server.
    pub event_id: Option<String>,
    pub title: String,
    pub event_type: EventType,
    pub all_day: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub location: String,
    pub description: String,
    pub notification_minutes: u32,
    pub visibility: Visibility,
    pub guests_allowed: bool,
    /// Organization carried by the event itself, last in line for identity resolution.
    pub organization_id: Option<String>,
}

impl Default for EventDraft {
    fn default() -> Self {
        EventDraft {
            event_id: None,
            title: String::new(),
            event_type: EventType::Internal,
            all_day: false,
            start_date: None,
            end_date: None,
            start_time: None,
            end_time: None,
            location: String::new(),
            description: String::new(),
            notification_minutes: DEFAULT_NOTIFICATION_MINUTES,
            visibility: Visibility::Public,
            guests_allowed: true,
            organization_id: None,
        }
    }
}

impl EventDraft {
    pub fn new(title: impl Into<String>) -> Self {
        EventDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Names of the fields still blocking the details step.
    pub fn missing_details(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.start_date.is_none() {
            missing.push("start date");
        }
        if self.end_date.is_none() {
            missing.push("end date");
        }
        if !self.all_day {
            if self.start_time.is_none() {
                missing.push("start time");
            }
            if self.end_time.is_none() {
                missing.push("end time");
            }
        }
        missing
    }

    pub fn details_complete(&self) -> bool {
        self.missing_details().is_empty()
    }

    pub fn validate_details(&self) -> WorknestResult<()> {
        let missing = self.missing_details();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WorknestError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    /// Start and end as `YYYY-MM-DDTHH:MM:SS`. All-day events span
    /// 00:00:00 on the start date to 23:59:00 on the end date.
    pub fn wire_bounds(&self) -> WorknestResult<(String, String)> {
        self.validate_details()?;

        // validate_details guarantees both dates, and both times unless all-day
        let (start_date, end_date) = match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(WorknestError::Validation("Missing event dates".into())),
        };

        let (start_time, end_time) = if self.all_day {
            (day_start(), day_end())
        } else {
            match (self.start_time, self.end_time) {
                (Some(s), Some(e)) => (s, e),
                _ => return Err(WorknestError::Validation("Missing event times".into())),
            }
        };

        Ok((
            combine(&format_date(start_date), &format_time(start_time)),
            combine(&format_date(end_date), &format_time(end_time)),
        ))
    }

    /// Build the create/update body. Only the participant list matching
    /// `event_type` is filled in; the other one is sent empty.
    pub fn to_payload(
        &self,
        context: &OrganizationContext,
        internal_guest_ids: Vec<String>,
        external_contacts: Vec<ExternalContact>,
    ) -> WorknestResult<EventPayload> {
        let (start, end) = self.wire_bounds()?;

        let (internal_guest_ids, external_contacts) = match self.event_type {
            EventType::Internal => (internal_guest_ids, Vec::new()),
            EventType::External => (Vec::new(), external_contacts),
        };

        Ok(EventPayload {
            title: self.title.trim().to_string(),
            description: self.description.clone(),
            location: self.location.clone(),
            all_day: self.all_day,
            start_time: start.clone(),
            end_time: end.clone(),
            start_date: start,
            end_date: end,
            event_type: self.event_type,
            internal_guest_ids,
            external_contacts,
            notification_minutes: self.notification_minutes,
            visibility: self.visibility,
            guests_allowed: self.guests_allowed,
            organization_id: context.organization_id.clone(),
            user_id: context.user_id.clone(),
            event_id: self.event_id.clone(),
        })
    }

    /// Rebuild a draft from what the server (or a cached snapshot) says.
    ///
    /// Events whose times read 00:00 to 23:59 are treated as all-day even if
    /// the flag was not stored.
    pub fn from_detail(detail: &EventDetail) -> Self {
        let start = detail
            .start_time
            .as_deref()
            .and_then(parse_wire_datetime)
            .or_else(|| detail.start_date.as_deref().and_then(parse_wire_datetime));
        let end = detail
            .end_time
            .as_deref()
            .and_then(parse_wire_datetime)
            .or_else(|| detail.end_date.as_deref().and_then(parse_wire_datetime));

        let looks_all_day = matches!(
            (start, end),
            (Some(s), Some(e)) if is_hh_mm(s.time(), 0, 0) && is_hh_mm(e.time(), 23, 59)
        );
        let all_day = detail.all_day || looks_all_day;

        let defaults = EventDraft::default();

        EventDraft {
            event_id: detail.event_id.clone(),
            title: detail.title.clone(),
            event_type: detail.event_type.unwrap_or_default(),
            all_day,
            start_date: start.map(|dt| dt.date()),
            end_date: end.map(|dt| dt.date()),
            start_time: if all_day { None } else { start.map(|dt| dt.time()) },
            end_time: if all_day { None } else { end.map(|dt| dt.time()) },
            location: detail.location.clone().unwrap_or_default(),
            description: detail.description.clone().unwrap_or_default(),
            notification_minutes: detail
                .notification_minutes
                .unwrap_or(defaults.notification_minutes),
            visibility: detail.visibility.unwrap_or(defaults.visibility),
            guests_allowed: detail.guests_allowed.unwrap_or(defaults.guests_allowed),
            organization_id: detail.organization_id.clone(),
        }
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn combine(date: &str, time: &str) -> String {
    format!("{date}T{time}")
}

fn day_start() -> NaiveTime {
    NaiveTime::MIN
}

fn day_end() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

fn is_hh_mm(time: NaiveTime, hour: u32, minute: u32) -> bool {
    time.hour() == hour && time.minute() == minute
}

/// Accepts the formats the backend has been seen to return: RFC 3339 with an
/// offset (kept as wall-clock time), naive date-times with or without
/// seconds/fractions, and bare dates (midnight).
pub fn parse_wire_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}
