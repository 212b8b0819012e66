//! Guest reconciliation.
//!
//! Some backend update paths replace the guest list instead of merging it,
//! so the client always sends the union of what it is adding and what the
//! server already has. Guests are never removed here.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::api::protocol::EventDetail;

/// Guest ids to send: persisted guests first, then newly picked ones.
///
/// Candidates are filtered against `valid_user_ids` when a directory was
/// available; persisted guests are kept unconditionally. No duplicates.
pub fn reconcile(
    candidates: &[String],
    existing: &[String],
    valid_user_ids: Option<&HashSet<String>>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(existing.len() + candidates.len());

    for id in existing {
        if !id.is_empty() && seen.insert(id.as_str()) {
            result.push(id.clone());
        }
    }

    for id in candidates {
        if valid_user_ids.is_some_and(|valid| !valid.contains(id)) {
            debug!(id, "dropping guest id unknown to the directory");
            continue;
        }
        if !id.is_empty() && seen.insert(id.as_str()) {
            result.push(id.clone());
        }
    }

    result
}

/// What the server currently holds as guests for `event_id`.
///
/// A new event has none. If the read fails, the guest list of the snapshot
/// the wizard was opened with is used instead, else nothing.
pub async fn existing_guest_ids(
    api: &ApiClient,
    organization_id: &str,
    event_id: Option<&str>,
    snapshot: Option<&EventDetail>,
) -> Vec<String> {
    let Some(event_id) = event_id else {
        return Vec::new();
    };

    match api.event_detail(organization_id, event_id).await {
        Ok(detail) => detail.internal_guest_ids,
        Err(e) => {
            let fallback = snapshot
                .map(|s| s.internal_guest_ids.clone())
                .unwrap_or_default();
            warn!(
                event_id,
                error = %e,
                fallback = fallback.len(),
                "could not read persisted guests, using snapshot"
            );
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_every_existing_guest() {
        let existing = ids(&["7", "8"]);
        let result = reconcile(&ids(&["12"]), &existing, None);

        for id in &existing {
            assert!(result.contains(id));
        }
        assert_eq!(result, ids(&["7", "8", "12"]));
    }

    #[test]
    fn existing_guests_survive_directory_filtering() {
        let result = reconcile(&ids(&["12", "99"]), &ids(&["7"]), Some(&set(&["12"])));
        assert_eq!(result, ids(&["7", "12"]));
    }

    #[test]
    fn overlap_produces_no_duplicates() {
        let result = reconcile(&ids(&["7", "12", "12"]), &ids(&["7", "7"]), None);
        assert_eq!(result, ids(&["7", "12"]));
    }

    #[test]
    fn missing_directory_fails_open() {
        let result = reconcile(&ids(&["ghost"]), &[], None);
        assert_eq!(result, ids(&["ghost"]));
    }

    #[test]
    fn empty_ids_are_ignored() {
        let result = reconcile(&ids(&["", "3"]), &ids(&[""]), None);
        assert_eq!(result, ids(&["3"]));
    }

    #[test]
    fn output_is_superset_of_existing_for_many_shapes() {
        let cases: [(&[&str], &[&str]); 4] = [
            (&["1"], &["2"]),
            (&["1", "2"], &["2", "3"]),
            (&["4"], &["4"]),
            (&["5", "6", "7"], &["7", "6", "5", "8"]),
        ];

        for (candidates, existing) in cases {
            let result = reconcile(&ids(candidates), &ids(existing), Some(&set(&["1"])));
            let unique: HashSet<_> = result.iter().collect();
            assert_eq!(unique.len(), result.len());
            for id in existing {
                assert!(result.iter().any(|r| r == id), "{id} dropped");
            }
        }
    }

    #[tokio::test]
    async fn new_events_have_no_existing_guests() {
        let server = MockServer::start().await;
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();

        assert!(existing_guest_ids(&api, "acme", None, None).await.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_guests_from_event_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/acme/events/e1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "event_id": "e1", "internal_guest_ids": [7] })),
            )
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();

        let guests = existing_guest_ids(&api, "acme", Some("e1"), None).await;
        assert_eq!(guests, ids(&["7"]));
    }

    #[tokio::test]
    async fn falls_back_to_snapshot_when_read_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let snapshot = EventDetail {
            internal_guest_ids: ids(&["3"]),
            ..Default::default()
        };

        let guests = existing_guest_ids(&api, "acme", Some("e1"), Some(&snapshot)).await;
        assert_eq!(guests, ids(&["3"]));

        let guests = existing_guest_ids(&api, "acme", Some("e1"), None).await;
        assert!(guests.is_empty());
    }
}
